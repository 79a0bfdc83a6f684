//! Retry configuration.
//!
//! Collects everything needed to wire an orchestrator to Redis: connection
//! URL, key namespaces, the backoff schedule and the retry policy.

use std::time::Duration;

use thiserror::Error;

use crate::queue::redis_gateway::DEFAULT_NAMESPACE;
use crate::retry::{
    BackoffSchedule, FailureReporting, RetryPolicy, DEFAULT_KEY_PREFIX, DEFAULT_TTL_MARGIN,
};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for retry orchestration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    // Connection settings
    /// Redis connection URL shared by the counter store and the gateway.
    pub redis_url: String,
    /// Prefix for attempt counter keys.
    pub key_prefix: String,
    /// Resque namespace used when resubmitting jobs.
    pub queue_namespace: String,

    // Retry settings
    /// Delay per attempt; its length is the retry limit.
    pub schedule: BackoffSchedule,
    /// Added to the next delay when bounding a counter's TTL.
    pub ttl_margin: Duration,
    /// Whether retried failures are reported to the caller.
    pub reporting: FailureReporting,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            queue_namespace: DEFAULT_NAMESPACE.to_string(),
            schedule: BackoffSchedule::default(),
            ttl_margin: DEFAULT_TTL_MARGIN,
            reporting: FailureReporting::default(),
        }
    }
}

impl RetryConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)
    /// - `RETRY_KEY_PREFIX`: Counter key prefix (default: resque:resque-retry)
    /// - `RETRY_QUEUE_NAMESPACE`: Resque namespace (default: resque)
    /// - `RETRY_BACKOFF_SCHEDULE`: Comma-separated delays in seconds
    ///   (default: 0,60,600,3600,10800,21600)
    /// - `RETRY_TTL_MARGIN_SECS`: Counter TTL margin in seconds (default: 3600)
    /// - `RETRY_REPORT_EVERY_FAILURE`: Report retried failures (default: false)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REDIS_URL") {
            config.redis_url = val;
        }

        if let Ok(val) = std::env::var("RETRY_KEY_PREFIX") {
            config.key_prefix = val;
        }

        if let Ok(val) = std::env::var("RETRY_QUEUE_NAMESPACE") {
            config.queue_namespace = val;
        }

        if let Ok(val) = std::env::var("RETRY_BACKOFF_SCHEDULE") {
            config.schedule = parse_schedule(&val, "RETRY_BACKOFF_SCHEDULE")?;
        }

        if let Ok(val) = std::env::var("RETRY_TTL_MARGIN_SECS") {
            let secs: u64 = parse_env_value(&val, "RETRY_TTL_MARGIN_SECS")?;
            config.ttl_margin = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("RETRY_REPORT_EVERY_FAILURE") {
            if parse_env_bool(&val, "RETRY_REPORT_EVERY_FAILURE")? {
                config.reporting = FailureReporting::ReportEveryFailure;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "redis_url cannot be empty".to_string(),
            ));
        }

        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "key_prefix cannot be empty".to_string(),
            ));
        }

        if self.queue_namespace.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "queue_namespace cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Retry policy derived from this configuration.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_ttl_margin(self.ttl_margin)
            .with_reporting(self.reporting)
    }

    // Builder methods

    /// Sets the Redis URL.
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Sets the counter key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the resque namespace.
    pub fn with_queue_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.queue_namespace = namespace.into();
        self
    }

    /// Sets the backoff schedule.
    pub fn with_schedule(mut self, schedule: BackoffSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the TTL margin.
    pub fn with_ttl_margin(mut self, margin: Duration) -> Self {
        self.ttl_margin = margin;
        self
    }

    /// Sets how retried failures are reported.
    pub fn with_reporting(mut self, reporting: FailureReporting) -> Self {
        self.reporting = reporting;
        self
    }
}

/// Parse an environment variable value.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

/// Parse a comma-separated schedule.
fn parse_schedule(value: &str, key: &str) -> Result<BackoffSchedule, ConfigError> {
    BackoffSchedule::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
