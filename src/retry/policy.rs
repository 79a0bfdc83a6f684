//! Retry policy knobs that are independent of the schedule.

use std::time::Duration;

/// Extra lifetime given to a counter beyond the next scheduled delay.
pub const DEFAULT_TTL_MARGIN: Duration = Duration::from_secs(3600);

/// How failures that still have retries left are reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureReporting {
    /// Return success once the retry is scheduled; only the final failure
    /// surfaces as an error.
    #[default]
    SuppressWhileRetrying,
    /// Return `RetryError::RetryScheduled` for every failure, after the
    /// retry has been scheduled.
    ReportEveryFailure,
}

/// Policy applied by the orchestrator to every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Added to the next delay when bounding the counter's TTL.
    pub ttl_margin: Duration,
    /// Reporting of retry-eligible failures.
    pub reporting: FailureReporting,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            ttl_margin: DEFAULT_TTL_MARGIN,
            reporting: FailureReporting::default(),
        }
    }
}

impl RetryPolicy {
    /// Sets the TTL safety margin.
    pub fn with_ttl_margin(mut self, margin: Duration) -> Self {
        self.ttl_margin = margin;
        self
    }

    /// Sets how retry-eligible failures are reported.
    pub fn with_reporting(mut self, reporting: FailureReporting) -> Self {
        self.reporting = reporting;
        self
    }

    /// Returns whether retry-eligible failures are hidden from the caller.
    pub fn suppresses_retry_errors(&self) -> bool {
        self.reporting == FailureReporting::SuppressWhileRetrying
    }
}
