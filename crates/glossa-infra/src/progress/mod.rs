//! Upload progress counters and per-entity upload leases
//!
//! An upload job is keyed by the owning entity id and consists of four keys:
//! the total task count, the remaining task count, a hash of per-slot error
//! messages and a hash of job metadata (the display file name). A fifth key
//! holds the advisory lease that keeps two uploads for the same entity apart.

mod memory;
#[cfg(feature = "progress-redis")]
mod redis_store;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use glossa_core::AppError;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryProgressStore;
#[cfg(feature = "progress-redis")]
pub use redis_store::RedisProgressStore;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Progress store unavailable: {0}")]
    Unavailable(String),

    #[error("Progress store command failed: {0}")]
    Command(String),
}

pub type ProgressResult<T> = Result<T, ProgressError>;

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        AppError::Cache(err.to_string())
    }
}

/// Proof of lease ownership; only the holder can release the lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseToken(pub String);

impl LeaseToken {
    pub fn generate() -> Self {
        LeaseToken(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn total_key(id: Uuid) -> String {
    format!("upload:{}:total", id)
}

pub(crate) fn remaining_key(id: Uuid) -> String {
    format!("upload:{}:remaining", id)
}

pub(crate) fn errors_key(id: Uuid) -> String {
    format!("upload:{}:errors", id)
}

pub(crate) fn meta_key(id: Uuid) -> String {
    format!("upload:{}:meta", id)
}

pub(crate) fn lease_key(id: Uuid) -> String {
    format!("upload:{}:lease", id)
}

pub(crate) const FILE_NAME_FIELD: &str = "file_name";

/// Counter store backing upload progress.
///
/// Counters are TTL-less; a job lives until [`ProgressStore::clear_job`] removes it.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Start a job: total and remaining are set to `total`, errors are reset.
    async fn init_job(&self, id: Uuid, total: i64, file_name: &str) -> ProgressResult<()>;

    /// Atomically decrement the remaining count and return the new value.
    async fn decrement_task(&self, id: Uuid) -> ProgressResult<i64>;

    /// Total task count, 0 when no job exists
    async fn get_total(&self, id: Uuid) -> ProgressResult<i64>;

    /// Remaining task count, 0 when no job exists
    async fn get_remaining(&self, id: Uuid) -> ProgressResult<i64>;

    /// Slot name to last error message
    async fn get_errors(&self, id: Uuid) -> ProgressResult<HashMap<String, String>>;

    /// Display file name given at job start, empty when no job exists
    async fn get_file_name(&self, id: Uuid) -> ProgressResult<String>;

    async fn record_error(&self, id: Uuid, slot: &str, message: &str) -> ProgressResult<()>;

    /// Delete every key of the job in one batch.
    async fn clear_job(&self, id: Uuid) -> ProgressResult<()>;

    /// Delete every key of the job, but only while it is still the finished job
    /// the caller observed: remaining is at or below zero and total equals
    /// `observed_total`. Check and delete happen as one step. Returns whether
    /// the job was cleared.
    async fn clear_finished_job(&self, id: Uuid, observed_total: i64) -> ProgressResult<bool>;

    /// Try to take the upload lease for `id`; `None` when another upload holds it.
    async fn acquire_lease(&self, id: Uuid, ttl: Duration) -> ProgressResult<Option<LeaseToken>>;

    /// Release the lease if `token` still owns it. Returns whether it was released.
    async fn release_lease(&self, id: Uuid, token: &LeaseToken) -> ProgressResult<bool>;

    async fn ping(&self) -> ProgressResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_keys_share_entity_prefix() {
        let id = Uuid::new_v4();
        let prefix = format!("upload:{}:", id);
        for key in [
            total_key(id),
            remaining_key(id),
            errors_key(id),
            meta_key(id),
            lease_key(id),
        ] {
            assert!(key.starts_with(&prefix), "{}", key);
        }
    }

    #[test]
    fn test_progress_error_maps_to_cache_error() {
        let err: AppError = ProgressError::Unavailable("connection refused".to_string()).into();
        assert!(matches!(err, AppError::Cache(_)));
    }
}
