//! Distributed retry coordination.
//!
//! This module decides, after every job execution, whether the job is done,
//! should be retried later, or has failed for good:
//!
//! - **RetryIdentity**: stable fingerprint of a job's arguments
//! - **BackoffSchedule**: attempt number → delay table, whose length is the
//!   retry limit
//! - **AttemptCounter**: TTL-bounded counter in a shared store, the only
//!   source of truth for the attempt number
//! - **RetryOrchestrator**: runs the job and applies the decision
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use queue_retry::queue::RedisQueueGateway;
//! use queue_retry::retry::{BackoffSchedule, RetryOrchestrator};
//! use queue_retry::store::RedisCounterStore;
//!
//! let store = Arc::new(RedisCounterStore::connect("redis://localhost:6379").await?);
//! let gateway = Arc::new(RedisQueueGateway::connect("redis://localhost:6379", "resque").await?);
//!
//! let orchestrator = RetryOrchestrator::new("SendEmail", Arc::new(send_email), store, gateway)
//!     .with_schedule(BackoffSchedule::from_secs(&[0, 60, 600]));
//!
//! // Called by the worker for every delivery of a SendEmail job
//! orchestrator.run("mailers", &args).await?;
//! ```

pub mod counter;
pub mod identity;
pub mod orchestrator;
pub mod policy;
pub mod schedule;

pub use counter::{AttemptCounter, BASELINE};
pub use identity::{retry_key, RetryIdentity, DEFAULT_KEY_PREFIX};
pub use orchestrator::{Outcome, RetryOrchestrator};
pub use policy::{FailureReporting, RetryPolicy, DEFAULT_TTL_MARGIN};
pub use schedule::{BackoffSchedule, DEFAULT_SCHEDULE_SECS};
