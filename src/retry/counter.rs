//! Attempt counter over a shared store.
//!
//! The counter is the single source of truth for "which attempt is this".
//! It is created lazily at [`BASELINE`], incremented once per execution,
//! bounded by a TTL so abandoned counters are reclaimed, and cleared when a
//! job reaches a terminal state.

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::retry::identity::{retry_key, RetryIdentity};
use crate::store::CounterStore;

/// Initial counter value; the first increment yields attempt 0.
pub const BASELINE: i64 = -1;

/// Namespaced attempt counter.
#[derive(Clone)]
pub struct AttemptCounter {
    store: Arc<dyn CounterStore>,
    prefix: String,
}

impl AttemptCounter {
    /// Creates a counter whose keys live under `prefix`.
    pub fn new(store: Arc<dyn CounterStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the underlying store.
    pub fn store(&self) -> Arc<dyn CounterStore> {
        Arc::clone(&self.store)
    }

    /// Builds the store key for a job and identity.
    pub fn key(&self, job_name: &str, identity: &RetryIdentity) -> String {
        retry_key(&self.prefix, job_name, identity)
    }

    /// Creates the counter at the baseline if it does not exist yet.
    pub async fn ensure(&self, key: &str) -> Result<(), StoreError> {
        self.store.set_if_absent(key, BASELINE).await?;
        Ok(())
    }

    /// Atomically advances the counter and returns the attempt number.
    pub async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        self.store.increment(key).await
    }

    /// Bounds the counter's lifetime.
    pub async fn bound(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.store.expire(key, ttl).await
    }

    /// Removes the counter.
    pub async fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(key).await
    }

    /// Reads the last attempt number recorded, if any.
    pub async fn current(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.store.get(key).await
    }

    /// Remaining lifetime of the counter.
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.store.ttl(key).await
    }
}
