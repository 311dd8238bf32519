//! Request and Response models for the booking service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_namespace, validate_session_id, InvalidateRequest, SessionQuery};
pub use responses::{
    CloseResponse, ErrorResponse, HealthResponse, InvalidateResponse, NavigationResponse,
    StatsResponse, StepResponse, SubmitResponse,
};
