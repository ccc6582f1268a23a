use super::request::{RawChargeRequest, RequestEvent, Response};
use crate::application::processor::TransactionProcessor;
use crate::application::recorder::TransactionRecorder;
use crate::application::retry::RetryController;
use crate::config::ProcessorConfig;
use crate::domain::account::Account;
use crate::domain::ports::{AccountStoreBox, TransactionStoreBox};
use crate::domain::transaction::{Decision, TransactionRecord};
use crate::error::{PaymentError, Result};
use crate::infrastructure::fault::{FaultInjectingAccountStore, RandomFaults};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Boundary between the transport and the authorization core.
///
/// Every request, valid or not, produces exactly one recorded transaction and
/// one 200 response whose body is the outcome message.
pub struct RequestHandler {
    controller: RetryController,
    recorder: TransactionRecorder,
    deadline: Option<Duration>,
}

impl RequestHandler {
    pub fn new(controller: RetryController, recorder: TransactionRecorder) -> Self {
        Self {
            controller,
            recorder,
            deadline: None,
        }
    }

    /// Sets the time budget each request gets, measured from when it is handled.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Wires the full pipeline from a config and the two stores.
    ///
    /// A non-zero `failure_rate` wraps the account store with random fault injection.
    pub fn from_config(
        config: &ProcessorConfig,
        account_store: AccountStoreBox,
        transaction_store: TransactionStoreBox,
    ) -> Result<Self> {
        config.validate()?;

        let account_store: AccountStoreBox = if config.failure_rate > 0.0 {
            Box::new(FaultInjectingAccountStore::new(
                account_store,
                Box::new(RandomFaults::new(config.failure_rate)?),
            ))
        } else {
            account_store
        };

        let processor =
            TransactionProcessor::new(account_store).with_conflict_retries(config.conflict_retries);
        let controller = RetryController::new(processor, config.retry_policy());
        let recorder = TransactionRecorder::new(transaction_store).with_id_length(config.id_length);

        Ok(Self::new(controller, recorder).with_deadline(config.deadline()))
    }

    /// Decodes a JSON request and handles it. Undecodable input is answered with a
    /// validation error like any other malformed request.
    pub async fn handle_json(&self, input: &str) -> Response {
        match serde_json::from_str::<RequestEvent>(input) {
            Ok(event) => self.handle(event.into_request()).await,
            Err(e) => {
                warn!(error = %e, "undecodable charge request");
                self.finish(
                    Decision::rejected("request is not a valid JSON object"),
                    "",
                    None,
                    None,
                )
                .await
            }
        }
    }

    /// Handles one raw input line. Bytes that are not UTF-8 are rejected the same
    /// way as undecodable JSON.
    pub async fn handle_bytes(&self, input: &[u8]) -> Response {
        match std::str::from_utf8(input) {
            Ok(text) => self.handle_json(text).await,
            Err(e) => {
                warn!(error = %e, "charge request is not valid UTF-8");
                self.finish(
                    Decision::rejected("request is not valid UTF-8"),
                    "",
                    None,
                    None,
                )
                .await
            }
        }
    }

    pub async fn handle(&self, raw: RawChargeRequest) -> Response {
        let deadline = self.deadline.map(|budget| Instant::now() + budget);

        match raw.validate() {
            Ok(request) => {
                let decision = self.controller.process_with_retry(&request, deadline).await;
                self.finish(
                    decision,
                    &request.merchant_id,
                    Some(request.account),
                    Some(request.amount.value()),
                )
                .await
            }
            Err(e) => {
                let reason = match e {
                    PaymentError::ValidationError(reason) => reason,
                    other => other.to_string(),
                };
                warn!(%reason, merchant = raw.merchant_id(), "rejecting charge request");
                self.finish(
                    Decision::rejected(&reason),
                    raw.merchant_id(),
                    raw.account_number(),
                    raw.amount_value(),
                )
                .await
            }
        }
    }

    async fn finish(
        &self,
        decision: Decision,
        merchant_id: &str,
        account_number: Option<u64>,
        amount: Option<Decimal>,
    ) -> Response {
        if let Err(e) = self
            .recorder
            .record(merchant_id, account_number, amount, decision.outcome)
            .await
        {
            error!(error = %e, outcome = %decision.outcome, "failed to record transaction");
        }

        info!(merchant = merchant_id, outcome = %decision.outcome, "{}", decision.message);
        Response::ok(decision.message)
    }

    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.controller.processor().accounts().await
    }

    pub async fn records(&self) -> Result<Vec<TransactionRecord>> {
        self.recorder.records().await
    }
}
