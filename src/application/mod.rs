//! Application layer containing the authorization core.
//!
//! A charge flows through `RetryController`, which drives `TransactionProcessor`
//! until it reaches a terminal outcome; `TransactionRecorder` then writes the
//! audit record for that outcome.

pub mod processor;
pub mod recorder;
pub mod retry;
