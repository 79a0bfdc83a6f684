//! queue-retry: distributed retry coordination for resque-style job queues.
//!
//! Wraps a job so that every failure is counted in a shared store, retried
//! according to a backoff schedule by resubmitting it to the queue, and
//! reported only once the schedule is exhausted.

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod retry;
pub mod store;

// Re-export commonly used types
pub use config::RetryConfig;
pub use error::{ConfigError, JobError, QueueError, RetryError, ScheduleError, StoreError};
pub use queue::{JobHandler, JobInvocation, MemoryQueueGateway, QueueGateway, RedisQueueGateway};
pub use retry::{BackoffSchedule, FailureReporting, Outcome, RetryOrchestrator, RetryPolicy};
pub use store::{CounterStore, MemoryCounterStore, RedisCounterStore};
