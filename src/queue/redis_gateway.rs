//! Resque-compatible queue gateway backed by Redis.
//!
//! Immediate submissions follow the resque layout: the queue name is added
//! to `{ns}:queues` and the payload is appended to `{ns}:queue:{queue}`.
//!
//! Delayed submissions follow resque-scheduler: the payload (which carries
//! its queue) is appended to `{ns}:delayed:{unix_ts}` and the timestamp is
//! added to the `{ns}:delayed_queue_schedule` sorted set. The scheduler
//! process moves due entries onto their queues.
//!
//! Both writes of a submission run in one MULTI/EXEC pipeline so a crash
//! cannot leave a timestamp without its payload.

use std::time::Duration;

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;

use super::job::JobInvocation;
use super::{QueueError, QueueGateway};

/// Default resque key namespace.
pub const DEFAULT_NAMESPACE: &str = "resque";

/// Redis-backed queue gateway using the resque wire format.
#[derive(Clone)]
pub struct RedisQueueGateway {
    /// Redis connection manager (handles reconnection automatically).
    redis: ConnectionManager,
    /// Key namespace, `resque` unless configured otherwise.
    namespace: String,
}

impl RedisQueueGateway {
    /// Connects to Redis and creates a gateway for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::ConnectionFailed` if the connection fails.
    pub async fn connect(redis_url: &str, namespace: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| QueueError::ConnectionFailed(e.to_string()))?;

        let redis = ConnectionManager::new(client)
            .await
            .map_err(|e| QueueError::ConnectionFailed(e.to_string()))?;

        Ok(Self::from_connection(redis, namespace))
    }

    /// Creates a gateway from an existing ConnectionManager.
    pub fn from_connection(redis: ConnectionManager, namespace: &str) -> Self {
        Self {
            redis,
            namespace: namespace.to_string(),
        }
    }

    /// Returns the key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the number of jobs waiting on `queue`.
    pub async fn len(&self, queue: &str) -> Result<usize, QueueError> {
        let mut conn = self.redis.clone();
        let len: usize = conn.llen(queue_key(&self.namespace, queue)).await?;
        Ok(len)
    }

    /// Returns the number of distinct timestamps with delayed jobs.
    pub async fn delayed_len(&self) -> Result<usize, QueueError> {
        let mut conn = self.redis.clone();
        let len: usize = conn.zcard(schedule_key(&self.namespace)).await?;
        Ok(len)
    }
}

#[async_trait::async_trait]
impl QueueGateway for RedisQueueGateway {
    async fn enqueue_now(
        &self,
        queue: &str,
        job_name: &str,
        args: &[Value],
    ) -> Result<(), QueueError> {
        let invocation = JobInvocation::new(job_name, queue, args.to_vec());
        let serialized = serde_json::to_string(&invocation.to_payload())?;

        let mut conn = self.redis.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .sadd(queues_key(&self.namespace), queue)
            .ignore()
            .rpush(queue_key(&self.namespace, queue), serialized)
            .ignore();
        pipe.query_async::<_, ()>(&mut conn).await?;

        debug!(queue = queue, job = job_name, "Enqueued job");
        Ok(())
    }

    async fn enqueue_after(
        &self,
        queue: &str,
        delay: Duration,
        job_name: &str,
        args: &[Value],
    ) -> Result<(), QueueError> {
        let timestamp = run_at(Utc::now(), delay)?;
        let invocation = JobInvocation::new(job_name, queue, args.to_vec());
        let serialized = serde_json::to_string(&invocation.to_delayed_payload())?;

        let mut conn = self.redis.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .rpush(delayed_key(&self.namespace, timestamp), serialized)
            .ignore()
            .zadd(schedule_key(&self.namespace), timestamp, timestamp)
            .ignore();
        pipe.query_async::<_, ()>(&mut conn).await?;

        debug!(
            queue = queue,
            job = job_name,
            run_at = timestamp,
            "Scheduled delayed job"
        );
        Ok(())
    }
}

/// Unix timestamp (seconds) at which a job delayed from `now` becomes due.
fn run_at(now: DateTime<Utc>, delay: Duration) -> Result<i64, QueueError> {
    let offset = chrono::Duration::from_std(delay).map_err(|_| QueueError::InvalidDelay(delay))?;
    now.checked_add_signed(offset)
        .map(|at| at.timestamp())
        .ok_or(QueueError::InvalidDelay(delay))
}

fn queues_key(namespace: &str) -> String {
    format!("{}:queues", namespace)
}

fn queue_key(namespace: &str, queue: &str) -> String {
    format!("{}:queue:{}", namespace, queue)
}

fn delayed_key(namespace: &str, timestamp: i64) -> String {
    format!("{}:delayed:{}", namespace, timestamp)
}

fn schedule_key(namespace: &str) -> String {
    format!("{}:delayed_queue_schedule", namespace)
}
