//! Error types for retry coordination.
//!
//! Errors are split by the subsystem that produces them:
//! - Counter store access (connectivity, protocol)
//! - Backoff schedule parsing
//! - The retry decision itself (exhaustion, resubmission failures)
//!
//! Queue and configuration errors live next to their modules
//! (`queue::QueueError`, `config::ConfigError`) and are re-exported here.

use std::time::Duration;

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::queue::QueueError;

/// Error type returned by wrapped jobs.
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while talking to the shared counter store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Counter store connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Redis operation failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected reply for '{key}': {message}")]
    UnexpectedReply { key: String, message: String },
}

/// Errors that can occur while building a backoff schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid delay '{value}' at position {index}: expected whole seconds")]
    InvalidDelay { index: usize, value: String },
}

/// Errors surfaced by the retry orchestrator.
///
/// Callers only ever see `Store` and `Enqueue` (infrastructure failures),
/// `Exhausted` (the final failure after all retries), or `RetryScheduled`
/// when every failure is reported.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("Attempt counter unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to resubmit job: {0}")]
    Enqueue(#[from] QueueError),

    #[error("Job '{job}' failed after {attempts} attempts: {source}")]
    Exhausted {
        job: String,
        attempts: i64,
        #[source]
        source: JobError,
    },

    #[error("Job '{job}' failed on attempt {attempt}, retry scheduled in {delay:?}: {source}")]
    RetryScheduled {
        job: String,
        attempt: i64,
        delay: Duration,
        #[source]
        source: JobError,
    },
}

impl RetryError {
    /// Returns whether this error is the terminal failure of a job.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Returns the number of attempts made, if this error carries one.
    pub fn attempts(&self) -> Option<i64> {
        match self {
            RetryError::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
