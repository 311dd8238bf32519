//! API Cache Module
//!
//! Read-through caching of studio backend reads, partitioned by namespace.

pub mod policy;
mod read_through;
mod upstream;

pub use policy::{request_signature, TtlPolicy};
pub use read_through::{KeyPattern, ReadThroughCache, ReadThroughStats};
pub use upstream::UpstreamClient;
