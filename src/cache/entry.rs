//! Cache Entry Module
//!
//! Defines the envelope written around every stored value.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored value together with its expiry metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Lifetime in milliseconds, always > 0
    pub ttl_ms: u64,
    /// Last successful read (Unix milliseconds)
    pub last_accessed: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stored at `now`.
    pub fn new(value: T, now: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl_ms,
            last_accessed: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is still live at exactly `stored_at + ttl_ms` and expired one
    /// millisecond later.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.meta().is_expired_at(now)
    }

    // == Time Remaining ==
    /// Milliseconds left before expiry, saturating at zero.
    pub fn time_remaining_at(&self, now: u64) -> u64 {
        self.meta().time_remaining_at(now)
    }

    fn meta(&self) -> EntryMeta {
        EntryMeta {
            stored_at: self.stored_at,
            ttl_ms: self.ttl_ms,
        }
    }
}

// == Entry Metadata ==
/// Expiry header of an entry, decoded without touching the value.
///
/// Sweeps decode this instead of the full entry so they work for any value
/// type stored in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EntryMeta {
    pub stored_at: u64,
    pub ttl_ms: u64,
}

impl EntryMeta {
    pub fn expires_at(&self) -> u64 {
        self.stored_at.saturating_add(self.ttl_ms)
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now.saturating_sub(self.stored_at) > self.ttl_ms
    }

    pub fn time_remaining_at(&self, now: u64) -> u64 {
        self.expires_at().saturating_sub(now)
    }
}
