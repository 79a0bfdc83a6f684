//! Redis-backed counter store.
//!
//! Every operation maps onto a single Redis command, so atomicity comes from
//! Redis itself: `SETNX` for lazy creation, `INCR` for the attempt number,
//! `EXPIRE` and `DEL` for bookkeeping.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::CounterStore;
use crate::error::StoreError;

/// Counter store backed by a shared Redis instance.
#[derive(Clone)]
pub struct RedisCounterStore {
    /// Redis connection manager (handles reconnection automatically).
    redis: ConnectionManager,
}

impl RedisCounterStore {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the URL is invalid or the
    /// server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let redis = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self { redis })
    }

    /// Creates a store from an existing ConnectionManager.
    ///
    /// Useful when the queue gateway and the counter share a connection.
    pub fn from_connection(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError> {
        let mut conn = self.redis.clone();
        let written: i64 = redis::cmd("SETNX")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(written == 1)
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.redis.clone();
        let value: i64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        // EXPIRE with 0 deletes the key immediately
        let secs = ttl.as_secs().max(1);
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(secs)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.redis.clone();
        let value: Option<i64> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.redis.clone();
        let secs: i64 = redis::cmd("TTL").arg(key).query_async(&mut conn).await?;

        // -2: key missing, -1: key without expiry
        match secs {
            s if s >= 0 => Ok(Some(Duration::from_secs(s as u64))),
            -1 | -2 => Ok(None),
            other => Err(StoreError::UnexpectedReply {
                key: key.to_string(),
                message: format!("TTL returned {}", other),
            }),
        }
    }
}
