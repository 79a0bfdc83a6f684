//! High-level recording interface over the raw Prometheus metrics.
//!
//! Recording is a no-op until `init_metrics()` has been called, so library
//! users that do not export metrics pay nothing for them.

use super::prometheus::{ATTEMPTS_TOTAL, BOOKKEEPING_ERRORS_TOTAL, OUTCOMES_TOTAL};

/// Outcome label for a successful attempt.
pub const OUTCOME_SUCCEEDED: &str = "succeeded";
/// Outcome label for a failure that was resubmitted.
pub const OUTCOME_RETRY_SCHEDULED: &str = "retry_scheduled";
/// Outcome label for the final failure.
pub const OUTCOME_EXHAUSTED: &str = "exhausted";

/// Metrics collector used by the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Record one execution attempt of `job`.
    pub fn record_attempt(&self, job: &str) {
        if let Some(attempts) = ATTEMPTS_TOTAL.get() {
            attempts.with_label_values(&[job]).inc();
        }
    }

    /// Record the outcome of an attempt.
    ///
    /// `outcome` is one of the `OUTCOME_*` labels.
    pub fn record_outcome(&self, job: &str, outcome: &str) {
        if let Some(outcomes) = OUTCOMES_TOTAL.get() {
            outcomes.with_label_values(&[job, outcome]).inc();
        }

        tracing::trace!(job = job, outcome = outcome, "Recorded outcome metric");
    }

    /// Record a tolerated bookkeeping failure (`expire` or `delete`).
    pub fn record_bookkeeping_error(&self, operation: &str) {
        if let Some(errors) = BOOKKEEPING_ERRORS_TOTAL.get() {
            errors.with_label_values(&[operation]).inc();
        }
    }
}
