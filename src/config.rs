use crate::application::processor::DEFAULT_CONFLICT_RETRIES;
use crate::application::recorder::DEFAULT_ID_LENGTH;
use crate::application::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Tunables of the authorization pipeline.
///
/// Every field has a default, so a config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Attempts made while the bank is unavailable.
    pub max_attempts: u32,
    /// Delay after the first failed attempt, doubled after each further one.
    pub base_delay_ms: u64,
    /// Balance re-reads allowed after losing a conditional write.
    pub conflict_retries: usize,
    /// Target length of generated transaction identifiers.
    pub id_length: usize,
    /// Probability that a store call is treated as unavailable.
    pub failure_rate: f64,
    /// Per-request deadline. No deadline when absent.
    pub deadline_ms: Option<u64>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
            id_length: DEFAULT_ID_LENGTH,
            failure_rate: 0.0,
            deadline_ms: None,
        }
    }
}

impl ProcessorConfig {
    /// Loads a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PaymentError::ValidationError(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(PaymentError::ValidationError(format!(
                "failure_rate must be within [0, 1], got {}",
                self.failure_rate
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}
