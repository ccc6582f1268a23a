use super::account::{AccountKey, Amount};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CardType {
    Credit,
    Debit,
}

impl CardType {
    /// Classifies a raw card type. Anything that is not `credit` (in any case)
    /// is treated as a debit card.
    pub fn classify(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("credit") {
            CardType::Credit
        } else {
            CardType::Debit
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardType::Credit => "Credit",
            CardType::Debit => "Debit",
        }
    }
}

/// A validated card charge, ready for authorization.
#[derive(Debug, PartialEq, Clone)]
pub struct ChargeRequest {
    pub bank: String,
    pub merchant_id: String,
    pub merchant_name: Option<String>,
    pub account: u64,
    pub card_type: CardType,
    pub amount: Amount,
}

impl ChargeRequest {
    pub fn account_key(&self) -> AccountKey {
        AccountKey::new(self.bank.clone(), self.account)
    }
}

/// Classification of a processed charge request.
///
/// `BankUnavailable` is the only transient outcome; every other variant is
/// terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Outcome {
    Approved,
    Declined,
    AccountError,
    BankUnavailable,
    MaxRetriesExceeded,
    Timeout,
    ValidationError,
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Approved => "Approved.",
            Outcome::Declined => "Declined. Insufficient Funds.",
            Outcome::AccountError => "Error - Bad Bank or Account Number.",
            Outcome::BankUnavailable => "Bank not available.",
            Outcome::MaxRetriesExceeded => "Max retries exceeded. Could not process transaction.",
            Outcome::Timeout => "Timed out. Could not process transaction.",
            Outcome::ValidationError => "Error - Invalid Request.",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Outcome::BankUnavailable)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The message and outcome produced for one charge request.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Decision {
    pub message: String,
    pub outcome: Outcome,
}

impl Decision {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            message: outcome.message().to_string(),
            outcome,
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self {
            message: format!("Error - Invalid Request: {reason}."),
            outcome: Outcome::ValidationError,
        }
    }
}

impl From<Outcome> for Decision {
    fn from(outcome: Outcome) -> Self {
        Self::new(outcome)
    }
}

/// The audit entry written once for every terminal outcome.
///
/// `account_number` and `amount` are only absent for requests rejected before
/// those fields could be parsed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub merchant_id: String,
    pub account_number: Option<u64>,
    pub amount: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    pub status: Outcome,
}
