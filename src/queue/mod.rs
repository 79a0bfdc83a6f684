//! Queue gateway used to resubmit failed jobs.
//!
//! The retry layer does not schedule anything itself. It hands resubmissions
//! to a [`QueueGateway`], which either pushes the job straight back onto its
//! queue or registers it for delayed execution.
//!
//! - [`RedisQueueGateway`]: resque wire format, with delayed jobs stored the
//!   way resque-scheduler expects them.
//! - [`MemoryQueueGateway`]: records submissions in order.
//!
//! # Redis Key Layout
//!
//! ```text
//! {ns}:queues                       set of known queue names
//! {ns}:queue:{queue}                list of {"class","args"} payloads
//! {ns}:delayed:{unix_ts}            list of {"class","args","queue"} payloads
//! {ns}:delayed_queue_schedule       sorted set of pending timestamps
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod job;
pub mod memory;
pub mod redis_gateway;

pub use job::{JobHandler, JobInvocation, ResquePayload};
pub use memory::{MemoryQueueGateway, Submission};
pub use redis_gateway::RedisQueueGateway;

/// Errors that can occur while resubmitting a job.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Failed to connect to Redis.
    #[error("Redis connection failed: {0}")]
    ConnectionFailed(String),

    /// Redis operation failed.
    #[error("Redis operation failed: {0}")]
    RedisError(#[from] redis::RedisError),

    /// Failed to serialize job data.
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// The delay cannot be turned into a schedule timestamp.
    #[error("Delay {0:?} is out of range")]
    InvalidDelay(Duration),
}

/// Accepts immediate or delayed job submissions.
#[async_trait]
pub trait QueueGateway: Send + Sync {
    /// Pushes the job onto `queue` for immediate pickup.
    async fn enqueue_now(&self, queue: &str, job_name: &str, args: &[Value])
        -> Result<(), QueueError>;

    /// Registers the job to be pushed onto `queue` once `delay` has passed.
    async fn enqueue_after(
        &self,
        queue: &str,
        delay: Duration,
        job_name: &str,
        args: &[Value],
    ) -> Result<(), QueueError>;
}
