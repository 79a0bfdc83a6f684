//! Backoff schedules.
//!
//! A schedule is an ordered table of delays indexed by zero-based attempt
//! number. Its length is the retry limit: a job is resubmitted once per
//! entry before it is declared exhausted.

use std::time::Duration;

use tracing::warn;

use crate::error::ScheduleError;

/// Default delays in seconds: 0s, 1m, 10m, 1h, 3h, 6h.
pub const DEFAULT_SCHEDULE_SECS: [u64; 6] = [0, 60, 600, 3600, 10800, 21600];

/// Ordered attempt → delay table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::from_secs(&DEFAULT_SCHEDULE_SECS)
    }
}

impl BackoffSchedule {
    /// Creates a schedule from explicit delays.
    ///
    /// An empty schedule is allowed and means the first failure is terminal.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Creates a schedule from whole-second delays.
    pub fn from_secs(secs: &[u64]) -> Self {
        Self::new(secs.iter().copied().map(Duration::from_secs).collect())
    }

    /// Parses a comma-separated list of seconds, e.g. `"0,60,600"`.
    ///
    /// Blank input yields an empty schedule.
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        if input.trim().is_empty() {
            return Ok(Self::new(Vec::new()));
        }

        let secs = input
            .split(',')
            .enumerate()
            .map(|(index, part)| {
                let part = part.trim();
                part.parse::<u64>().map_err(|_| ScheduleError::InvalidDelay {
                    index,
                    value: part.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_secs(&secs))
    }

    /// Number of retries tolerated before giving up.
    pub fn retry_limit(&self) -> usize {
        self.delays.len()
    }

    /// Returns true if the schedule has no entries.
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Returns the configured delays in order.
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Returns the delay for a zero-based attempt number.
    ///
    /// Attempts past the last entry reuse the last delay. Negative attempts
    /// map to the first entry. An empty schedule always yields zero.
    pub fn delay_for(&self, attempt: i64) -> Duration {
        let Some(last) = self.delays.len().checked_sub(1) else {
            return Duration::ZERO;
        };

        let index = usize::try_from(attempt.max(0)).unwrap_or(usize::MAX);
        if index > last {
            warn!(
                attempt = attempt,
                retry_limit = self.delays.len(),
                "Attempt is beyond the backoff schedule, reusing the last delay"
            );
            return self.delays[last];
        }

        self.delays[index]
    }
}
