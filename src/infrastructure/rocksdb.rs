use crate::domain::account::{Account, AccountKey, Balance};
use crate::domain::ports::{AccountStore, TransactionStore};
use crate::domain::transaction::TransactionRecord;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, ErrorKind, OptimisticTransactionDB, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing account balances.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for both `Account` and `TransactionRecord` entities using
/// separate Column Families. The database is opened as an
/// `OptimisticTransactionDB` so the conditional balance write is checked at
/// commit time: a concurrent writer touching the same key makes the commit fail
/// with `Busy`, which is reported as a lost race.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<OptimisticTransactionDB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("accounts" and "transactions") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = OptimisticTransactionDB::open_cf_descriptors(
            &opts,
            path,
            vec![cf_accounts, cf_transactions],
        )?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn account_key(key: &AccountKey) -> Vec<u8> {
        let mut bytes = key.bank.as_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(&key.account.to_be_bytes());
        bytes
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| {
            PaymentError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| {
            PaymentError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Deserialization error: {}", e),
            )))
        })
    }

    fn get_account(&self, key: &AccountKey) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, Self::account_key(key))? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn swap_balance(&self, key: &AccountKey, expected: Balance, new: Balance) -> Result<bool> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let db_key = Self::account_key(key);

        let txn = self.db.transaction();
        let Some(bytes) = txn.get_for_update_cf(cf, &db_key, true)? else {
            return Ok(false);
        };

        let mut account: Account = Self::decode(&bytes)?;
        if account.balance != expected {
            return Ok(false);
        }

        account.balance = new;
        txn.put_cf(cf, &db_key, Self::encode(&account)?)?;

        match txn.commit() {
            Ok(()) => Ok(true),
            Err(e) if matches!(e.kind(), ErrorKind::Busy | ErrorKind::TryAgain) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn scan<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        let mut items = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            items.push(Self::decode(&value)?);
        }
        Ok(items)
    }
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn balance(&self, key: &AccountKey) -> Result<Option<Balance>> {
        Ok(self.get_account(key)?.map(|account| account.balance))
    }

    async fn compare_and_set(
        &self,
        key: &AccountKey,
        expected: Balance,
        new: Balance,
    ) -> Result<bool> {
        self.swap_balance(key, expected, new)
    }

    async fn store(&self, account: Account) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, Self::account_key(&account.key()), Self::encode(&account)?)?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        self.scan(CF_ACCOUNTS)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn store(&self, record: TransactionRecord) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        self.db.put_cf(
            cf,
            record.transaction_id.as_bytes(),
            Self::encode(&record)?,
        )?;
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, transaction_id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<TransactionRecord>> {
        self.scan(CF_TRANSACTIONS)
    }
}
