//! Error types for the booking service
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::booking::StepId;
use crate::models::ErrorResponse;

// == Storage Error Enum ==
/// Failures inside the expiring store and its backends.
///
/// These never reach callers of the store: they are logged and degrade to a
/// cache miss or a dropped write.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Value could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend refused the write because its quota is used up
    #[error("Quota exceeded writing '{key}': needs {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// Entries must live for at least one millisecond
    #[error("Invalid TTL for '{0}': must be greater than zero")]
    InvalidTtl(String),

    /// File backend could not persist its contents
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// == Fetch Error Enum ==
/// Failure of a read-through fetch.
///
/// Cloneable so a single in-flight fetch can hand the same error to every
/// caller waiting on it.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The supplied fetch function failed
    #[error("Upstream request failed: {0}")]
    Upstream(Arc<anyhow::Error>),

    /// Fetched value could not be turned into JSON
    #[error("Could not encode fetched value: {0}")]
    Encode(String),

    /// Cached JSON did not match the requested type
    #[error("Could not decode cached value: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn upstream(err: anyhow::Error) -> Self {
        FetchError::Upstream(Arc::new(err))
    }
}

// == Submit Error Enum ==
/// Failure of a single booking submission attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Transient failure; the attempt may be retried
    #[error("Network error: {0}")]
    Network(String),

    /// The backend refused the booking; retrying will not help
    #[error("Booking rejected: {0}")]
    Rejected(String),
}

impl SubmitError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Network(_))
    }
}

// == Booking Error Enum ==
/// Unified error type for the booking service.
#[derive(Error, Debug)]
pub enum BookingError {
    /// Step number outside 1..=5
    #[error("Invalid step: {0}")]
    InvalidStep(u8),

    /// Navigation blocked because the current step is not valid
    #[error("Step {0} is incomplete")]
    StepIncomplete(StepId),

    /// Submission attempted before every step is valid
    #[error("Booking is incomplete: {valid_steps} of 5 steps valid")]
    Incomplete { valid_steps: usize },

    /// Every submission attempt failed; the draft is kept
    #[error("Submission failed after {attempts} attempts: {reason}")]
    SubmissionFailed { attempts: u32, reason: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Read-through fetch failed with no stale value to fall back on
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A collaborator is not configured
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BookingError::InvalidStep(_) => StatusCode::NOT_FOUND,
            BookingError::StepIncomplete(_) => StatusCode::CONFLICT,
            BookingError::Incomplete { .. } => StatusCode::CONFLICT,
            BookingError::SubmissionFailed { .. } => StatusCode::BAD_GATEWAY,
            BookingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BookingError::Fetch(_) => StatusCode::BAD_GATEWAY,
            BookingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the booking service.
pub type Result<T> = std::result::Result<T, BookingError>;
