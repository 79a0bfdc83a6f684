//! Metrics module for Prometheus-based monitoring.
//!
//! Counts execution attempts and their outcomes per job, plus the counter
//! bookkeeping failures that the retry layer tolerates.
//!
//! # Example
//!
//! ```ignore
//! use queue_retry::metrics::{init_metrics, export_metrics};
//!
//! init_metrics().expect("Failed to initialize metrics");
//! // ... run orchestrated jobs ...
//! let metrics_text = export_metrics();
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::{
    MetricsCollector, OUTCOME_EXHAUSTED, OUTCOME_RETRY_SCHEDULED, OUTCOME_SUCCEEDED,
};
pub use prometheus::{
    export_metrics, init_metrics, ATTEMPTS_TOTAL, BOOKKEEPING_ERRORS_TOTAL, OUTCOMES_TOTAL,
    REGISTRY,
};
