//! Inkbook - booking drafts and API reads for a tattoo studio, kept in an
//! expiring store
//!
//! Provides a multi-step booking wizard whose steps expire when left idle,
//! and a read-through cache for studio backend reads.

pub mod api;
pub mod api_cache;
pub mod booking;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_sweep_task;
