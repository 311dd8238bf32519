//! Booking Wizard
//!
//! Sequences the five step adapters of one session into the booking flow:
//! current-step navigation, aggregate progress, reset and submission.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::booking::adapter::StepAdapter;
use crate::booking::steps::StepId;
use crate::booking::submit::{submit_with_retry, BookingRequest, BookingSubmitter, Confirmation, RetryPolicy};
use crate::booking::validation::FieldMessage;
use crate::booking::StepRecord;
use crate::cache::{Clock, Namespace, SharedStore};
use crate::error::{BookingError, Result};

/// Key of the current-step pointer inside a session namespace.
pub const CURRENT_STEP_KEY: &str = "booking-current-step";

// == Wizard Settings ==
/// Lifetimes used by every wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardSettings {
    /// Sliding lifetime of each step record
    pub step_ttl_ms: u64,
    /// Lifetime of the current-step pointer
    pub session_ttl_ms: u64,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            step_ttl_ms: 60_000,
            session_ttl_ms: 30 * 60_000,
        }
    }
}

// == Summaries ==
#[derive(Debug, Clone, Serialize)]
pub struct StepStatus {
    pub step: StepId,
    pub title: &'static str,
    pub valid: bool,
    pub missing: Vec<&'static str>,
    pub messages: Vec<FieldMessage>,
    pub time_remaining_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub current_step: StepId,
    pub progress: u8,
    pub complete: bool,
    pub steps: Vec<StepStatus>,
}

// == Booking Wizard ==
/// View of one booking session over the shared store.
///
/// The wizard itself is stateless; constructing one per request is cheap.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    session_id: String,
    namespace: Namespace,
    store: SharedStore,
    settings: WizardSettings,
    adapters: Vec<StepAdapter>,
}

impl BookingWizard {
    pub fn new(
        session_id: impl Into<String>,
        store: SharedStore,
        clock: Arc<dyn Clock>,
        settings: WizardSettings,
    ) -> Self {
        let session_id = session_id.into();
        let namespace = Namespace::session(&session_id);
        let adapters = StepId::ALL
            .iter()
            .map(|step| {
                StepAdapter::new(
                    *step,
                    &namespace,
                    store.clone(),
                    clock.clone(),
                    settings.step_ttl_ms,
                )
            })
            .collect();

        Self {
            session_id,
            namespace,
            store,
            settings,
            adapters,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn adapter(&self, step: StepId) -> &StepAdapter {
        &self.adapters[step.number() as usize - 1]
    }

    // == Current Step ==
    pub async fn current_step(&self) -> StepId {
        let key = self.namespace.key(CURRENT_STEP_KEY);
        let stored: Option<u8> = self.store.write().await.get(&key);
        stored.and_then(StepId::from_number).unwrap_or(StepId::One)
    }

    async fn set_current_step(&self, step: StepId) {
        let key = self.namespace.key(CURRENT_STEP_KEY);
        self.store
            .write()
            .await
            .set(&key, &step.number(), self.settings.session_ttl_ms);
    }

    // == Navigation ==
    /// Advances one step if the current step is valid.
    pub async fn next(&self) -> Result<StepId> {
        let current = self.current_step().await;
        if !self.adapter(current).is_valid().await {
            return Err(BookingError::StepIncomplete(current));
        }

        let target = current.next().unwrap_or(current);
        self.set_current_step(target).await;
        debug!(session = %self.session_id, from = %current, to = %target, "Advanced step");
        Ok(target)
    }

    /// Goes back one step; stays on step 1.
    pub async fn previous(&self) -> StepId {
        let current = self.current_step().await;
        let target = current.previous().unwrap_or(current);
        self.set_current_step(target).await;
        target
    }

    /// Returns to an earlier step. Jumping ahead leaves the state unchanged.
    pub async fn jump_to(&self, n: u8) -> Result<StepId> {
        let target = StepId::from_number(n).ok_or(BookingError::InvalidStep(n))?;
        let current = self.current_step().await;

        if target > current {
            debug!(session = %self.session_id, current = %current, requested = %target, "Ignoring jump ahead");
            return Ok(current);
        }

        self.set_current_step(target).await;
        Ok(target)
    }

    // == Progress ==
    /// Number of steps that are valid right now, each judged on its own.
    pub async fn valid_steps(&self) -> usize {
        let mut count = 0;
        for adapter in &self.adapters {
            if adapter.is_valid().await {
                count += 1;
            }
        }
        count
    }

    /// Share of valid steps, 0 to 100 in steps of 20.
    ///
    /// Steps are counted independently: a later step can count while an
    /// earlier one has expired back to empty.
    pub async fn progress_percentage(&self) -> u8 {
        (self.valid_steps().await * 100 / StepId::ALL.len()) as u8
    }

    pub async fn is_complete(&self) -> bool {
        self.valid_steps().await == StepId::ALL.len()
    }

    pub async fn summary(&self) -> SessionSummary {
        let mut steps = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let report = adapter.report().await;
            steps.push(StepStatus {
                step: adapter.step(),
                title: adapter.step().title(),
                valid: report.is_valid(),
                missing: report.missing,
                messages: report.messages,
                time_remaining_ms: adapter.time_remaining().await,
            });
        }

        let valid = steps.iter().filter(|s| s.valid).count();
        SessionSummary {
            session_id: self.session_id.clone(),
            current_step: self.current_step().await,
            progress: (valid * 100 / StepId::ALL.len()) as u8,
            complete: valid == StepId::ALL.len(),
            steps,
        }
    }

    // == Reset ==
    /// Clears every step and returns to step 1.
    pub async fn reset_all(&self) {
        for adapter in &self.adapters {
            adapter.clear().await;
        }
        self.store
            .write()
            .await
            .remove(&self.namespace.key(CURRENT_STEP_KEY));
        info!(session = %self.session_id, "Booking draft reset");
    }

    /// Clears the steps holding personal data. Returns the steps cleared.
    pub async fn discard_sensitive(&self) -> Vec<StepId> {
        let mut cleared = Vec::new();
        for adapter in self.adapters.iter().filter(|a| a.step().is_sensitive()) {
            if adapter.clear().await {
                cleared.push(adapter.step());
            }
        }
        debug!(session = %self.session_id, cleared = cleared.len(), "Discarded sensitive steps");
        cleared
    }

    // == Submit ==
    pub async fn booking_request(&self) -> BookingRequest {
        let mut steps: Vec<StepRecord> = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            steps.push(adapter.load().await);
        }
        BookingRequest {
            session_id: self.session_id.clone(),
            steps,
        }
    }

    /// Submits a complete draft.
    ///
    /// On success the draft is cleared. When every attempt fails the draft is
    /// kept so the client can submit again.
    pub async fn submit(
        &self,
        submitter: &dyn BookingSubmitter,
        policy: &RetryPolicy,
    ) -> Result<Confirmation> {
        let valid_steps = self.valid_steps().await;
        if valid_steps < StepId::ALL.len() {
            return Err(BookingError::Incomplete { valid_steps });
        }

        let booking = self.booking_request().await;
        let confirmation = submit_with_retry(submitter, &booking, policy).await?;
        self.reset_all().await;
        Ok(confirmation)
    }
}
