//! Shared counter stores backing the attempt counter.
//!
//! The retry layer never keeps authoritative attempt state in process
//! memory. Instead it talks to a [`CounterStore`]: any store that offers
//! atomic set-if-absent, increment, expire and delete over string keys.
//!
//! - [`RedisCounterStore`]: SETNX / INCR / EXPIRE / DEL against Redis,
//!   shared by every worker process.
//! - [`MemoryCounterStore`]: an in-process store with the same semantics,
//!   for single-process deployments and tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub mod memory;
pub mod redis_store;

pub use memory::MemoryCounterStore;
pub use redis_store::RedisCounterStore;

/// Atomic integer counters with expiry, addressed by string keys.
///
/// Implementations must make `increment` linearizable: concurrent callers
/// on the same key each observe a distinct value.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Stores `value` under `key` only if the key does not exist.
    ///
    /// Returns `true` if the value was written.
    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError>;

    /// Atomically increments the counter and returns the new value.
    ///
    /// A missing key is treated as zero.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Sets a time-to-live on the key. Missing keys are ignored.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Removes the key. Missing keys are ignored.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Reads the current value without modifying it.
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Returns the remaining time-to-live, or `None` if the key is missing
    /// or has no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}
