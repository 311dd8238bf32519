//! Cache Statistics Module
//!
//! Tracks expiring store activity: hits, misses, expiry and failed writes.

use serde::Serialize;

// == Cache Stats ==
/// Counters for the expiring store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that returned a live value
    pub hits: u64,
    /// Reads that found nothing usable (absent, expired or undecodable)
    pub misses: u64,
    /// Entries removed because a read found them expired
    pub expired: u64,
    /// Entries removed by sweeps
    pub swept: u64,
    /// Writes dropped because of serialization or quota errors
    pub write_failures: u64,
    /// Current number of entries in the backend
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts an entry removed because a read found it expired. The read
    /// itself is recorded separately as a miss.
    pub fn record_expired(&mut self) {
        self.expired += 1;
    }

    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    pub fn record_write_failure(&mut self) {
        self.write_failures += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
