//! API Module
//!
//! HTTP handlers and routing for the booking service REST API.
//!
//! # Endpoints
//! - `GET /sessions/:id` - Session summary (`?new_booking=true` starts over)
//! - `DELETE /sessions/:id` - Discard the whole draft
//! - `POST /sessions/:id/close` - Discard steps holding personal data
//! - `GET|PATCH|DELETE /sessions/:id/steps/:step` - Load, save or clear a step
//! - `POST /sessions/:id/next`, `/previous`, `/jump/:step` - Navigation
//! - `POST /sessions/:id/submit` - Submit the booking
//! - `GET /api/:namespace/*path` - Read-through upstream GET
//! - `POST /cache/:namespace/invalidate` - Drop cached reads by pattern
//! - `GET /stats` - Store and read-through statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
