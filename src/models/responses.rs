//! Response DTOs for the booking service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::api_cache::ReadThroughStats;
use crate::booking::{Confirmation, FieldMessage, StepId, StepRecord, StepReport};
use crate::cache::CacheStats;

/// Response body for the step endpoints (GET/PATCH /sessions/:id/steps/:step)
#[derive(Debug, Clone, Serialize)]
pub struct StepResponse {
    pub session_id: String,
    pub step: StepId,
    pub title: &'static str,
    pub record: StepRecord,
    pub valid: bool,
    pub missing: Vec<&'static str>,
    pub messages: Vec<FieldMessage>,
    pub time_remaining_ms: u64,
}

impl StepResponse {
    pub fn new(
        session_id: impl Into<String>,
        step: StepId,
        record: StepRecord,
        report: StepReport,
        time_remaining_ms: u64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            step,
            title: step.title(),
            record,
            valid: report.is_valid(),
            missing: report.missing,
            messages: report.messages,
            time_remaining_ms,
        }
    }
}

/// Response body for navigation (next, previous, jump)
#[derive(Debug, Clone, Serialize)]
pub struct NavigationResponse {
    pub session_id: String,
    pub current_step: StepId,
    pub progress: u8,
}

/// Response body for a successful submission (POST /sessions/:id/submit)
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub confirmation_id: String,
    pub attempts: u32,
}

impl From<Confirmation> for SubmitResponse {
    fn from(confirmation: Confirmation) -> Self {
        Self {
            message: format!("Booking {} confirmed", confirmation.confirmation_id),
            confirmation_id: confirmation.confirmation_id,
            attempts: confirmation.attempts,
        }
    }
}

/// Response body for POST /sessions/:id/close
#[derive(Debug, Clone, Serialize)]
pub struct CloseResponse {
    pub session_id: String,
    pub cleared: Vec<StepId>,
}

/// Response body for POST /cache/:namespace/invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub namespace: String,
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub store: CacheStats,
    /// Store hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub api: ReadThroughStats,
}

impl StatsResponse {
    pub fn new(store: CacheStats, api: ReadThroughStats) -> Self {
        Self {
            hit_rate: store.hit_rate(),
            store,
            api,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
