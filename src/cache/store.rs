//! Expiring Store Module
//!
//! Main cache engine: JSON envelopes with TTL metadata over a pluggable
//! storage backend. Storage failures are logged and degrade to misses; they
//! are never returned to callers.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, Clock, EntryMeta, MemoryStorage, StorageBackend};
use crate::error::StorageError;

// == Lookup ==
/// Result of a stale-aware read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Fresh(T),
    Stale(T),
}

impl<T> Lookup<T> {
    pub fn into_value(self) -> T {
        match self {
            Lookup::Fresh(v) | Lookup::Stale(v) => v,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Lookup::Stale(_))
    }
}

// == Expiring Store ==
/// Key/value store where every entry carries its own expiry.
#[derive(Debug)]
pub struct ExpiringStore {
    /// Raw item storage
    backend: Box<dyn StorageBackend>,
    /// Time source for stamps and expiry checks
    clock: Arc<dyn Clock>,
    /// Activity counters
    stats: CacheStats,
}

impl ExpiringStore {
    // == Constructor ==
    pub fn new(backend: Box<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            stats: CacheStats::new(),
        }
    }

    /// Store over an unbounded in-memory backend.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Box::new(MemoryStorage::new()), clock)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_ms`, replacing any existing entry.
    ///
    /// Returns false when the write was dropped; the reason is logged.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, ttl_ms: u64) -> bool {
        match self.try_set(key, value, ttl_ms) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Dropping cache write");
                self.stats.record_write_failure();
                false
            }
        }
    }

    fn try_set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        ttl_ms: u64,
    ) -> Result<(), StorageError> {
        if ttl_ms == 0 {
            return Err(StorageError::InvalidTtl(key.to_string()));
        }

        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        let raw = serde_json::to_string(&entry)?;
        self.backend.set_item(key, raw)?;
        self.stats.set_total_entries(self.backend.len());
        Ok(())
    }

    // == Get ==
    /// Returns the live value under `key`.
    ///
    /// Absent and undecodable entries are misses. Expired entries are deleted
    /// and count as misses. A hit refreshes `last_accessed`.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        match self.read(key)? {
            Lookup::Fresh(value) => Some(value),
            Lookup::Stale(_) => {
                self.backend.remove_item(key);
                self.stats.set_total_entries(self.backend.len());
                self.stats.record_expired();
                debug!(key, "Removed expired entry on read");
                None
            }
        }
    }

    // == Read ==
    /// Stale-aware read that leaves expired entries in place.
    pub fn read<T: DeserializeOwned>(&mut self, key: &str) -> Option<Lookup<T>> {
        let Some(raw) = self.backend.get_item(key) else {
            self.stats.record_miss();
            return None;
        };

        let mut entry: CacheEntry<Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Undecodable cache entry treated as miss");
                self.stats.record_miss();
                return None;
            }
        };

        let value = match T::deserialize(&entry.value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Cached value has unexpected shape, treated as miss");
                self.stats.record_miss();
                return None;
            }
        };

        let now = self.clock.now_ms();
        if entry.is_expired_at(now) {
            self.stats.record_miss();
            return Some(Lookup::Stale(value));
        }

        entry.last_accessed = now;
        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.backend.touch_item(key, raw) {
                    debug!(key, error = %e, "Could not refresh last_accessed");
                }
            }
            Err(e) => debug!(key, error = %e, "Could not refresh last_accessed"),
        }
        self.stats.record_hit();
        Some(Lookup::Fresh(value))
    }

    // == Entry ==
    /// Full entry under `key` without any side effects, expired or not.
    pub fn entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = self.backend.get_item(key)?;
        serde_json::from_str(&raw).ok()
    }

    // == Remove ==
    /// Deletes the entry under `key`. Returns true if one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.backend.remove_item(key);
        self.stats.set_total_entries(self.backend.len());
        removed
    }

    // == Expiry Queries ==
    /// True if `key` is absent, undecodable or past its expiry.
    pub fn is_expired(&self, key: &str) -> bool {
        match self.meta(key) {
            Some(meta) => meta.is_expired_at(self.clock.now_ms()),
            None => true,
        }
    }

    /// Milliseconds until `key` expires; zero when absent or expired.
    pub fn time_remaining(&self, key: &str) -> u64 {
        self.meta(key)
            .map(|meta| meta.time_remaining_at(self.clock.now_ms()))
            .unwrap_or(0)
    }

    fn meta(&self, key: &str) -> Option<EntryMeta> {
        let raw = self.backend.get_item(key)?;
        serde_json::from_str(&raw).ok()
    }

    // == Sweep Expired ==
    /// Removes every expired entry, optionally only under `prefix`.
    ///
    /// Items that do not decode as entries are left alone. Returns the number
    /// of entries removed.
    pub fn sweep_expired(&mut self, prefix: Option<&str>) -> usize {
        self.sweep_stale(prefix, 0)
    }

    /// Removes entries that have been expired for longer than `grace_ms`.
    ///
    /// Entries still inside the grace window stay readable as stale.
    pub fn sweep_stale(&mut self, prefix: Option<&str>, grace_ms: u64) -> usize {
        let cutoff = self.clock.now_ms().saturating_sub(grace_ms);
        let expired: Vec<String> = self
            .keys(prefix)
            .into_iter()
            .filter(|key| self.meta(key).is_some_and(|meta| meta.is_expired_at(cutoff)))
            .collect();

        let count = expired.len();
        for key in expired {
            self.backend.remove_item(&key);
        }

        self.stats.record_swept(count);
        self.stats.set_total_entries(self.backend.len());
        count
    }

    // == Remove Matching ==
    /// Removes every key under `prefix` accepted by `matches`.
    pub fn remove_matching<F>(&mut self, prefix: &str, matches: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .keys(Some(prefix))
            .into_iter()
            .filter(|key| matches(key))
            .collect();

        let count = doomed.len();
        for key in doomed {
            self.backend.remove_item(&key);
        }

        self.stats.set_total_entries(self.backend.len());
        count
    }

    // == Keys ==
    /// Keys currently held, optionally filtered by prefix.
    pub fn keys(&self, prefix: Option<&str>) -> Vec<String> {
        let mut keys = self.backend.keys();
        if let Some(prefix) = prefix {
            keys.retain(|key| key.starts_with(prefix));
        }
        keys
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.backend.len());
        stats
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.len() == 0
    }
}
