//! In-process counter store.
//!
//! Mirrors the Redis semantics (lazy expiry, missing keys read as zero on
//! increment) behind a single mutex. Only workers inside the same process
//! share its counters.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::CounterStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Counter store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCounterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .expect("counter store lock poisoned")
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Returns true if no live keys remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` on the live entry for `key`, dropping it first if expired.
    fn with_entry<T>(&self, key: &str, f: impl FnOnce(&mut HashMap<String, Entry>) -> T) -> T {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("counter store lock poisoned");
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        f(&mut entries)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError> {
        Ok(self.with_entry(key, |entries| {
            if entries.contains_key(key) {
                return false;
            }
            entries.insert(
                key.to_string(),
                Entry {
                    value,
                    expires_at: None,
                },
            );
            true
        }))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        Ok(self.with_entry(key, |entries| {
            let entry = entries.entry(key.to_string()).or_insert(Entry {
                value: 0,
                expires_at: None,
            });
            entry.value += 1;
            entry.value
        }))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.with_entry(key, |entries| {
            if let Some(entry) = entries.get_mut(key) {
                // Unrepresentable deadlines mean the key never expires
                entry.expires_at = Instant::now().checked_add(ttl);
            }
        });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.with_entry(key, |entries| {
            entries.remove(key);
        });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.with_entry(key, |entries| entries.get(key).map(|entry| entry.value)))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        Ok(self.with_entry(key, |entries| {
            entries
                .get(key)
                .and_then(|entry| entry.expires_at)
                .map(|at| at.saturating_duration_since(Instant::now()))
        }))
    }
}
