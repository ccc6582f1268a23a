use crate::domain::account::{Account, AccountKey, Balance};
use crate::domain::ports::{AccountStore, AccountStoreBox, FaultInjector, FaultInjectorBox};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Never injects a failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFaults;

impl FaultInjector for NoFaults {
    fn should_fail(&self) -> bool {
        false
    }
}

/// Fails each call independently with the given probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomFaults {
    probability: f64,
}

impl RandomFaults {
    pub fn new(probability: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&probability) {
            Ok(Self { probability })
        } else {
            Err(PaymentError::ValidationError(format!(
                "failure probability must be within [0, 1], got {probability}"
            )))
        }
    }
}

impl FaultInjector for RandomFaults {
    fn should_fail(&self) -> bool {
        rand::thread_rng().gen_bool(self.probability)
    }
}

/// Replays a fixed sequence of failures, then reports the store as healthy.
///
/// Also counts how many times it was consulted, which tests use to assert how
/// many attempts were made.
#[derive(Debug, Default)]
pub struct ScriptedFaults {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl ScriptedFaults {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails the next `n` calls.
    pub fn failing(n: usize) -> Self {
        Self::new(std::iter::repeat_n(true, n))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaultInjector for ScriptedFaults {
    fn should_fail(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .map(|mut script| script.pop_front().unwrap_or(false))
            .unwrap_or(false)
    }
}

impl<T: FaultInjector + ?Sized> FaultInjector for std::sync::Arc<T> {
    fn should_fail(&self) -> bool {
        (**self).should_fail()
    }
}

/// Decorates an account store so that `ping` reports it unavailable whenever the
/// injector says so. Every other call is passed through.
pub struct FaultInjectingAccountStore {
    inner: AccountStoreBox,
    faults: FaultInjectorBox,
}

impl FaultInjectingAccountStore {
    pub fn new(inner: AccountStoreBox, faults: FaultInjectorBox) -> Self {
        Self { inner, faults }
    }
}

#[async_trait]
impl AccountStore for FaultInjectingAccountStore {
    async fn ping(&self) -> Result<()> {
        if self.faults.should_fail() {
            return Err(PaymentError::StoreUnavailable(
                "injected fault".to_string(),
            ));
        }
        self.inner.ping().await
    }

    async fn balance(&self, key: &AccountKey) -> Result<Option<Balance>> {
        self.inner.balance(key).await
    }

    async fn compare_and_set(
        &self,
        key: &AccountKey,
        expected: Balance,
        new: Balance,
    ) -> Result<bool> {
        self.inner.compare_and_set(key, expected, new).await
    }

    async fn store(&self, account: Account) -> Result<()> {
        self.inner.store(account).await
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        self.inner.get_all().await
    }
}
