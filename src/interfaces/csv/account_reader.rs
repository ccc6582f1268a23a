use crate::domain::account::{Account, Balance};
use crate::error::{PaymentError, Result};
use std::io::Read;

/// Reads the accounts used to seed the balance table from a CSV source.
///
/// Expects a `bank,account,balance` header. Whitespace around fields is trimmed.
pub struct AccountReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> AccountReader<R> {
    /// Creates a new `AccountReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes accounts.
    ///
    /// Rows with a negative balance are reported as validation errors.
    pub fn accounts(self) -> impl Iterator<Item = Result<Account>> {
        self.reader.into_deserialize().map(|result| {
            let account: Account = result.map_err(PaymentError::from)?;
            if account.balance < Balance::ZERO {
                return Err(PaymentError::ValidationError(format!(
                    "account {} has a negative balance",
                    account.key()
                )));
            }
            Ok(account)
        })
    }
}
