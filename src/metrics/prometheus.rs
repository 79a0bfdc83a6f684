//! Prometheus metrics registration and export.
//!
//! This module defines the Prometheus metrics used by the retry layer and
//! provides functions for initializing, registering, and exporting them.

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::{Mutex, OnceLock};

/// Global Prometheus registry for all queue_retry metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Total job execution attempts, labeled by job.
pub static ATTEMPTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Attempt outcomes, labeled by job and outcome
/// (`succeeded`, `retry_scheduled`, `exhausted`).
pub static OUTCOMES_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Tolerated counter bookkeeping failures, labeled by operation
/// (`expire`, `delete`).
pub static BOOKKEEPING_ERRORS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Serializes `init_metrics` so every global comes from the same registry.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize all metrics and register them with the registry.
///
/// Calling this more than once, from any number of threads, is harmless;
/// later calls keep the metrics created by the first one.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric registration fails.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let _guard = INIT_LOCK.lock().expect("metrics init lock poisoned");
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let attempts_total = CounterVec::new(
        Opts::new("queue_retry_attempts_total", "Total job execution attempts"),
        &["job"],
    )?;

    let outcomes_total = CounterVec::new(
        Opts::new("queue_retry_outcomes_total", "Job attempt outcomes"),
        &["job", "outcome"],
    )?;

    let bookkeeping_errors_total = CounterVec::new(
        Opts::new(
            "queue_retry_bookkeeping_errors_total",
            "Tolerated attempt counter bookkeeping failures",
        ),
        &["operation"],
    )?;

    registry.register(Box::new(attempts_total.clone()))?;
    registry.register(Box::new(outcomes_total.clone()))?;
    registry.register(Box::new(bookkeeping_errors_total.clone()))?;

    // Counters first, so a registry seen without the lock is fully populated
    let _ = ATTEMPTS_TOTAL.set(attempts_total);
    let _ = OUTCOMES_TOTAL.set(outcomes_total);
    let _ = BOOKKEEPING_ERRORS_TOTAL.set(bookkeeping_errors_total);
    let _ = REGISTRY.set(registry);

    tracing::info!("Prometheus metrics initialized successfully");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns a comment line instead of metrics if the registry has not been
/// initialized or encoding fails.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}
