//! Glossa Infrastructure Library
//!
//! This crate provides shared infrastructure components used by the Glossa service:
//! - Upload progress counters and per-entity upload leases
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Error response shape

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;
pub mod progress;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{get_request_id, request_id_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

pub use error::ErrorResponse;

pub use progress::{LeaseToken, MemoryProgressStore, ProgressError, ProgressResult, ProgressStore};

#[cfg(feature = "progress-redis")]
pub use progress::RedisProgressStore;
