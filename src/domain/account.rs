use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;

/// Represents the monetary balance held by an account.
///
/// This is a wrapper around `rust_decimal::Decimal` so balances never go through
/// floating point arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

/// Represents a positive monetary amount for a charge.
///
/// Ensures that charge amounts are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Returns the balance left after charging `amount`, or `None` when the
    /// balance does not cover it.
    pub fn checked_debit(self, amount: Amount) -> Option<Self> {
        if self.0 >= amount.value() {
            Some(self - amount.into())
        } else {
            None
        }
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifies an account in the balance table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountKey {
    pub bank: String,
    pub account: u64,
}

impl AccountKey {
    pub fn new(bank: impl Into<String>, account: u64) -> Self {
        Self {
            bank: bank.into(),
            account,
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bank, self.account)
    }
}

/// A row of the balance table.
///
/// Accounts are provisioned outside the authorization path; the engine only
/// ever debits them.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub bank: String,
    pub account: u64,
    pub balance: Balance,
}

impl Account {
    pub fn new(bank: impl Into<String>, account: u64, balance: Balance) -> Self {
        Self {
            bank: bank.into(),
            account,
            balance,
        }
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.bank.clone(), self.account)
    }
}
