//! Cache Module
//!
//! Expiring key/value storage: entries carry their own TTL, backends are
//! pluggable and time comes from an injected clock.

mod backend;
mod clock;
mod entry;
mod namespace;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryMeta};
pub use namespace::{Namespace, NAMESPACE_SEPARATOR, SESSION_NAMESPACE};
pub use stats::CacheStats;
pub use store::{ExpiringStore, Lookup};

/// Store handle shared by the wizard, the read-through cache and the sweep task.
pub type SharedStore = Arc<RwLock<ExpiringStore>>;

/// Wraps a store for sharing across tasks.
pub fn shared(store: ExpiringStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}
