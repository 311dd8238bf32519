//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: removes expired store entries once at start and then on a
//!   fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
