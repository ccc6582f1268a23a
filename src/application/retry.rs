use super::processor::TransactionProcessor;
use crate::domain::transaction::{ChargeRequest, Decision, Outcome};
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Bounded exponential backoff for transient store outages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay slept after the given (1-based) failed attempt: `base_delay * 2^(attempt - 1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Wraps a `TransactionProcessor` and retries it while the bank is unavailable.
///
/// Only `BankUnavailable` is retried. Every other outcome is returned as soon as
/// the processor produces it.
pub struct RetryController {
    processor: TransactionProcessor,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(processor: TransactionProcessor, policy: RetryPolicy) -> Self {
        Self { processor, policy }
    }

    pub fn processor(&self) -> &TransactionProcessor {
        &self.processor
    }

    /// Processes a charge, backing off between attempts that hit an unavailable bank.
    ///
    /// The optional `deadline` is checked before every attempt and caps every
    /// backoff; once it has passed the charge ends with `Timeout` instead of
    /// spending the remaining attempts.
    pub async fn process_with_retry(
        &self,
        request: &ChargeRequest,
        deadline: Option<Instant>,
    ) -> Decision {
        for attempt in 1..=self.policy.max_attempts {
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                warn!(attempt, merchant = %request.merchant_id, "deadline expired before attempt");
                return Outcome::Timeout.into();
            }

            let decision = self.processor.process(request).await;
            if !decision.outcome.is_transient() {
                return decision;
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "bank not available, backing off"
            );
            let wake = Instant::now() + delay;
            sleep_until(deadline.map_or(wake, |deadline| wake.min(deadline))).await;
        }

        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            warn!(merchant = %request.merchant_id, "deadline expired during final backoff");
            return Outcome::Timeout.into();
        }

        Outcome::MaxRetriesExceeded.into()
    }
}
