//! Command-line interface for queue-retry.
//!
//! Provides commands for computing retry keys, printing backoff schedules,
//! and inspecting or resetting live attempt counters.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
