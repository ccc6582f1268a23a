use super::account::{Account, AccountKey, Amount, Balance};
use super::transaction::TransactionRecord;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Result of a conditional debit against the balance table.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DebitResult {
    /// The debit was written; carries the balance left on the account.
    Approved(Balance),
    /// The balance does not cover the amount. Nothing was written.
    Declined,
    /// Unknown bank/account, or a write conflict that could not be resolved.
    AccountError,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `PaymentError::StoreUnavailable` when the store cannot serve requests.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn balance(&self, key: &AccountKey) -> Result<Option<Balance>>;

    /// Writes `new` only if the stored balance still equals `expected`.
    ///
    /// Returns `false` when the condition does not hold or the account does not exist.
    async fn compare_and_set(&self, key: &AccountKey, expected: Balance, new: Balance)
    -> Result<bool>;

    async fn store(&self, account: Account) -> Result<()>;

    async fn get_all(&self) -> Result<Vec<Account>>;

    /// Debits `amount` from the account using optimistic concurrency.
    ///
    /// The balance is read, checked and written back conditionally. A lost write
    /// means another debit landed in between, so the read is repeated for as long
    /// as the balance keeps moving and still covers the amount. Only a store that
    /// rejects the write while reporting an unchanged balance is given up on, after
    /// `conflict_retries` such stalls, as an account error.
    async fn debit(
        &self,
        key: &AccountKey,
        amount: Amount,
        conflict_retries: usize,
    ) -> Result<DebitResult> {
        let mut previous: Option<Balance> = None;
        let mut stalled = 0;

        loop {
            let Some(current) = self.balance(key).await? else {
                return Ok(DebitResult::AccountError);
            };

            if previous == Some(current) {
                stalled += 1;
                if stalled > conflict_retries {
                    warn!(account = %key, conflict_retries, "debit abandoned, store rejects writes without progress");
                    return Ok(DebitResult::AccountError);
                }
            }

            let Some(remaining) = current.checked_debit(amount) else {
                return Ok(DebitResult::Declined);
            };

            if self.compare_and_set(key, current, remaining).await? {
                return Ok(DebitResult::Approved(remaining));
            }

            debug!(account = %key, %current, stalled, "balance changed since read, retrying debit");
            previous = Some(current);
        }
    }
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn store(&self, record: TransactionRecord) -> Result<()>;
    async fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>>;
    async fn get_all(&self) -> Result<Vec<TransactionRecord>>;
}

/// Decides whether the next call to the backing store should be treated as
/// unavailable.
pub trait FaultInjector: Send + Sync {
    fn should_fail(&self) -> bool;
}

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type FaultInjectorBox = Box<dyn FaultInjector>;
