//! Per-Step Form State Adapter
//!
//! Binds one wizard step of one session to one entry in the expiring store.
//! The adapter keeps no copy of the record: every call reads the store, so an
//! expired step reads back as its empty default.

use std::sync::Arc;

use tracing::debug;

use crate::booking::record::{merge, StepRecord};
use crate::booking::steps::StepId;
use crate::booking::validation::{validate, StepReport};
use crate::cache::{Clock, Namespace, SharedStore};

// == Step Adapter ==
#[derive(Debug, Clone)]
pub struct StepAdapter {
    step: StepId,
    key: String,
    store: SharedStore,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl StepAdapter {
    pub fn new(
        step: StepId,
        namespace: &Namespace,
        store: SharedStore,
        clock: Arc<dyn Clock>,
        ttl_ms: u64,
    ) -> Self {
        Self {
            step,
            key: namespace.key(step.store_key()),
            store,
            clock,
            ttl_ms,
        }
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // == Load ==
    /// Saved record, or the step's empty default on a miss.
    pub async fn load(&self) -> StepRecord {
        let saved: Option<StepRecord> = self.store.write().await.get(&self.key);
        saved.unwrap_or_else(|| self.step.default_record())
    }

    // == Save ==
    /// Merges `partial` over the current record and writes it back.
    ///
    /// Every save restarts the TTL window. Returns the merged record.
    pub async fn save(&self, partial: StepRecord) -> StepRecord {
        let mut store = self.store.write().await;
        let mut record: StepRecord = store
            .get(&self.key)
            .unwrap_or_else(|| self.step.default_record());

        merge(&mut record, partial);
        if store.set(&self.key, &record, self.ttl_ms) {
            debug!(key = %self.key, fields = record.len(), "Saved step record");
        }
        record
    }

    // == Validation ==
    pub async fn report(&self) -> StepReport {
        let record = self.load().await;
        validate(self.step, &record, self.clock.today())
    }

    pub async fn is_valid(&self) -> bool {
        self.report().await.is_valid()
    }

    // == Clear ==
    /// Removes the saved record. Returns true if one existed.
    pub async fn clear(&self) -> bool {
        self.store.write().await.remove(&self.key)
    }

    /// Milliseconds until the saved record expires, zero when nothing is saved.
    pub async fn time_remaining(&self) -> u64 {
        self.store.read().await.time_remaining(&self.key)
    }
}
