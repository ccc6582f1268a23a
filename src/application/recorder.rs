use crate::domain::id::IdGenerator;
use crate::domain::ports::TransactionStoreBox;
use crate::domain::transaction::{Outcome, TransactionRecord};
use crate::error::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

/// Longer than the 20-character timestamp prefix so every id gets a random suffix.
pub const DEFAULT_ID_LENGTH: usize = 32;

/// Writes the audit record for every terminal outcome.
pub struct TransactionRecorder {
    store: TransactionStoreBox,
    ids: IdGenerator,
    id_length: usize,
}

impl TransactionRecorder {
    pub fn new(store: TransactionStoreBox) -> Self {
        Self {
            store,
            ids: IdGenerator::new(),
            id_length: DEFAULT_ID_LENGTH,
        }
    }

    pub fn with_id_length(mut self, id_length: usize) -> Self {
        self.id_length = id_length;
        self
    }

    /// Stamps a fresh identifier and the current time, then writes the record once.
    pub async fn record(
        &self,
        merchant_id: &str,
        account_number: Option<u64>,
        amount: Option<Decimal>,
        outcome: Outcome,
    ) -> Result<TransactionRecord> {
        let record = TransactionRecord {
            transaction_id: self.ids.next_id(self.id_length),
            merchant_id: merchant_id.to_string(),
            account_number,
            amount,
            timestamp: Utc::now(),
            status: outcome,
        };

        self.store.store(record.clone()).await?;
        debug!(transaction_id = %record.transaction_id, status = %record.status, "transaction recorded");

        Ok(record)
    }

    pub async fn records(&self) -> Result<Vec<TransactionRecord>> {
        self.store.get_all().await
    }
}
