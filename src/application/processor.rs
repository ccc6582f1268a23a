use crate::domain::account::Account;
use crate::domain::ports::{AccountStoreBox, DebitResult};
use crate::domain::transaction::{ChargeRequest, Decision, Outcome};
use crate::error::Result;
use tracing::{debug, info, warn};

/// How many times a debit retries a write the store rejected without the balance moving.
pub const DEFAULT_CONFLICT_RETRIES: usize = 3;

/// Applies the authorization rules to a single charge.
///
/// The processor holds no per-request state: every call reads and conditionally
/// writes the balance through the injected `AccountStore`.
pub struct TransactionProcessor {
    account_store: AccountStoreBox,
    conflict_retries: usize,
}

impl TransactionProcessor {
    pub fn new(account_store: AccountStoreBox) -> Self {
        Self {
            account_store,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    pub fn with_conflict_retries(mut self, conflict_retries: usize) -> Self {
        self.conflict_retries = conflict_retries;
        self
    }

    /// Authorizes one charge and classifies the result.
    ///
    /// Store availability is checked before any balance is read, so an outage is
    /// always reported as `BankUnavailable` and never as an account error.
    pub async fn process(&self, request: &ChargeRequest) -> Decision {
        let key = request.account_key();
        debug!(
            account = %key,
            merchant = %request.merchant_id,
            card = request.card_type.label(),
            amount = %request.amount,
            "processing charge"
        );

        if let Err(e) = self.account_store.ping().await {
            warn!(account = %key, error = %e, "bank not available");
            return Outcome::BankUnavailable.into();
        }

        let outcome = match self
            .account_store
            .debit(&key, request.amount, self.conflict_retries)
            .await
        {
            Ok(DebitResult::Approved(remaining)) => {
                info!(account = %key, amount = %request.amount, %remaining, "charge approved");
                Outcome::Approved
            }
            Ok(DebitResult::Declined) => Outcome::Declined,
            Ok(DebitResult::AccountError) => Outcome::AccountError,
            Err(e) => {
                warn!(account = %key, error = %e, "store failed during debit");
                Outcome::BankUnavailable
            }
        };

        Decision::new(outcome)
    }

    /// Snapshot of the balance table behind this processor.
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.account_store.get_all().await
    }
}
