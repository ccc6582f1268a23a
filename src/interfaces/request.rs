use crate::domain::account::Amount;
use crate::domain::transaction::{CardType, ChargeRequest};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A request field that callers send either as a JSON string or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Text(String),
    Number(serde_json::Number),
}

impl RawField {
    fn as_account(&self) -> Option<u64> {
        match self {
            RawField::Text(text) => text.trim().parse().ok(),
            RawField::Number(number) => number.as_u64(),
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        let text = match self {
            RawField::Text(text) => text.trim().to_string(),
            RawField::Number(number) => number.to_string(),
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }
}

/// A charge request exactly as decoded from the wire. Nothing is checked yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawChargeRequest {
    pub bank: Option<String>,
    pub merchant_name: Option<String>,
    pub merchant_token: Option<String>,
    pub cc_num: Option<RawField>,
    pub card_type: Option<String>,
    pub amount: Option<RawField>,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(PaymentError::ValidationError(format!(
            "missing field `{field}`"
        ))),
    }
}

impl RawChargeRequest {
    /// Checks every required field and builds the charge handed to the core.
    pub fn validate(&self) -> Result<ChargeRequest> {
        let bank = required(&self.bank, "bank")?;
        let merchant_id = required(&self.merchant_token, "merchant_token")?;
        let card_type = required(&self.card_type, "card_type")?;

        let account = self
            .cc_num
            .as_ref()
            .ok_or_else(|| PaymentError::ValidationError("missing field `cc_num`".to_string()))?
            .as_account()
            .ok_or_else(|| {
                PaymentError::ValidationError("`cc_num` must be an account number".to_string())
            })?;

        let amount = self
            .amount
            .as_ref()
            .ok_or_else(|| PaymentError::ValidationError("missing field `amount`".to_string()))?
            .as_decimal()
            .ok_or_else(|| PaymentError::ValidationError("`amount` must be a decimal".to_string()))?;

        Ok(ChargeRequest {
            bank: bank.to_string(),
            merchant_id: merchant_id.to_string(),
            merchant_name: self.merchant_name.clone(),
            account,
            card_type: CardType::classify(card_type),
            amount: Amount::new(amount)?,
        })
    }

    pub fn merchant_id(&self) -> &str {
        self.merchant_token.as_deref().unwrap_or_default()
    }

    /// The account number, when it parses on its own.
    pub fn account_number(&self) -> Option<u64> {
        self.cc_num.as_ref().and_then(RawField::as_account)
    }

    /// The amount, when it parses on its own.
    pub fn amount_value(&self) -> Option<Decimal> {
        self.amount.as_ref().and_then(RawField::as_decimal)
    }
}

/// An inbound event: either the bare request object or the request wrapped in
/// a `body` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RequestEvent {
    Envelope { body: RawChargeRequest },
    Bare(RawChargeRequest),
}

impl RequestEvent {
    pub fn into_request(self) -> RawChargeRequest {
        match self {
            RequestEvent::Envelope { body } => body,
            RequestEvent::Bare(request) => request,
        }
    }
}

/// HTTP-style response. The status is 200 for every outcome; callers tell
/// outcomes apart by the body text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            headers: BTreeMap::from([("Content-Type".to_string(), "text/html".to_string())]),
            body: body.into(),
        }
    }
}
