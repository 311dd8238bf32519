//! Expiry Sweep Task
//!
//! Background task that periodically removes expired store entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::{Namespace, SharedStore};

/// Spawns a task sweeping expired entries from `store`.
///
/// Session drafts are removed as soon as they expire. Everything else, the
/// read-through cache in particular, is kept for `stale_retention` past its
/// expiry so it can still be served stale or as a fallback.
///
/// The first sweep runs immediately, then one every `interval`. The returned
/// handle must be aborted on shutdown; the task never ends on its own.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(store.clone(), Duration::from_secs(10), Duration::from_secs(3600));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(
    store: SharedStore,
    interval: Duration,
    stale_retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            stale_retention_ms = stale_retention.as_millis() as u64,
            "Starting expiry sweep task"
        );

        let drafts = Namespace::sessions().prefix();
        let retention_ms = stale_retention.as_millis() as u64;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (expired_drafts, stale) = {
                let mut store = store.write().await;
                let expired_drafts = store.sweep_expired(Some(&drafts));
                let stale = store.sweep_stale(None, retention_ms);
                (expired_drafts, stale)
            };

            if expired_drafts + stale > 0 {
                info!(expired_drafts, stale, "Expiry sweep removed entries");
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    })
}
