use crate::domain::account::{Account, AccountKey, Balance};
use crate::domain::ports::{AccountStore, TransactionStore};
use crate::domain::transaction::TransactionRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory balance table.
///
/// Uses `Arc<RwLock<HashMap<AccountKey, Account>>>` to allow shared concurrent access.
/// Reads and conditional writes take the lock separately, so concurrent debits race
/// exactly like they would against a remote table.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountKey, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn balance(&self, key: &AccountKey) -> Result<Option<Balance>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(key).map(|account| account.balance))
    }

    async fn compare_and_set(
        &self,
        key: &AccountKey,
        expected: Balance,
        new: Balance,
    ) -> Result<bool> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(key) {
            Some(account) if account.balance == expected => {
                account.balance = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn store(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.key(), account);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(all)
    }
}

/// A thread-safe in-memory store for transaction records.
///
/// Uses `Arc<RwLock<HashMap<String, TransactionRecord>>>` for shared concurrent access.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<HashMap<String, TransactionRecord>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn store(&self, record: TransactionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.transaction_id.clone(), record);
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(transaction_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<TransactionRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.transaction_id.cmp(&b.transaction_id));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Amount;
    use crate::domain::ports::DebitResult;
    use crate::domain::transaction::Outcome;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    async fn seeded(balance: rust_decimal::Decimal) -> InMemoryAccountStore {
        let store = InMemoryAccountStore::new();
        store
            .store(Account::new("First Bank", 123, Balance::new(balance)))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_in_memory_account_store() {
        let store = seeded(dec!(100.0)).await;
        let key = AccountKey::new("First Bank", 123);

        assert_eq!(
            store.balance(&key).await.unwrap(),
            Some(Balance::new(dec!(100.0)))
        );
        assert!(
            store
                .balance(&AccountKey::new("First Bank", 999))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_compare_and_set_rejects_stale_balance() {
        let store = seeded(dec!(100.0)).await;
        let key = AccountKey::new("First Bank", 123);

        let stale = Balance::new(dec!(90.0));
        assert!(
            !store
                .compare_and_set(&key, stale, Balance::new(dec!(40.0)))
                .await
                .unwrap()
        );
        assert_eq!(
            store.balance(&key).await.unwrap(),
            Some(Balance::new(dec!(100.0)))
        );

        assert!(
            store
                .compare_and_set(&key, Balance::new(dec!(100.0)), Balance::new(dec!(40.0)))
                .await
                .unwrap()
        );
        assert_eq!(
            store.balance(&key).await.unwrap(),
            Some(Balance::new(dec!(40.0)))
        );
    }

    #[tokio::test]
    async fn test_compare_and_set_on_missing_account() {
        let store = InMemoryAccountStore::new();
        let key = AccountKey::new("First Bank", 123);
        assert!(
            !store
                .compare_and_set(&key, Balance::ZERO, Balance::ZERO)
                .await
                .unwrap()
        );
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_debit_approved() {
        let store = seeded(dec!(100.00)).await;
        let key = AccountKey::new("First Bank", 123);

        let result = store.debit(&key, amount(dec!(50.00)), 3).await.unwrap();
        assert_eq!(result, DebitResult::Approved(Balance::new(dec!(50.00))));
        assert_eq!(
            store.balance(&key).await.unwrap(),
            Some(Balance::new(dec!(50.00)))
        );
    }

    #[tokio::test]
    async fn test_debit_declined_leaves_balance() {
        let store = seeded(dec!(10.00)).await;
        let key = AccountKey::new("First Bank", 123);

        let result = store.debit(&key, amount(dec!(10.01)), 3).await.unwrap();
        assert_eq!(result, DebitResult::Declined);
        assert_eq!(
            store.balance(&key).await.unwrap(),
            Some(Balance::new(dec!(10.00)))
        );
    }

    #[tokio::test]
    async fn test_debit_uses_requested_bank() {
        let store = seeded(dec!(100.00)).await;
        store
            .store(Account::new("Bank of America", 123, Balance::new(dec!(7.00))))
            .await
            .unwrap();

        let result = store
            .debit(&AccountKey::new("First Bank", 123), amount(dec!(5.00)), 3)
            .await
            .unwrap();
        assert_eq!(result, DebitResult::Approved(Balance::new(dec!(95.00))));
        assert_eq!(
            store
                .balance(&AccountKey::new("Bank of America", 123))
                .await
                .unwrap(),
            Some(Balance::new(dec!(7.00)))
        );
    }

    #[tokio::test]
    async fn test_debit_unknown_account() {
        let store = seeded(dec!(100.00)).await;
        let result = store
            .debit(&AccountKey::new("Other Bank", 123), amount(dec!(1)), 3)
            .await
            .unwrap();
        assert_eq!(result, DebitResult::AccountError);
    }

    #[tokio::test]
    async fn test_in_memory_transaction_store() {
        let store = InMemoryTransactionStore::new();
        let record = TransactionRecord {
            transaction_id: "20240101000000000000abc".to_string(),
            merchant_id: "m-1".to_string(),
            account_number: Some(123),
            amount: Some(dec!(50.00)),
            timestamp: Utc::now(),
            status: Outcome::Approved,
        };

        store.store(record.clone()).await.unwrap();
        let retrieved = store.get(&record.transaction_id).await.unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert!(store.get("missing").await.unwrap().is_none());
        assert_eq!(store.get_all().await.unwrap(), vec![record]);
    }
}
