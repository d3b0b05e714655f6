//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::{StorageBackend, Visibility};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for glossa_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => {
                glossa_core::AppError::NotFound(format!("Stored object not found: {}", key))
            }
            StorageError::InvalidKey(msg) => glossa_core::AppError::InvalidInput(msg),
            other => glossa_core::AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// Keys are produced by [`crate::keys::build_storage_key`]; backends never invent keys.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`, replacing any existing object.
    async fn put(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
        visibility: Visibility,
    ) -> StorageResult<()>;

    /// Delete a file by its storage key. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Generate a presigned/temporary URL for direct access (GET)
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Stable URL of an object stored with [`Visibility::PublicRead`]
    fn public_url(&self, storage_key: &str) -> String;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Access URL for a stored key: the public URL for public objects, otherwise a
    /// signed URL valid for `ttl`. The result must never be persisted.
    async fn resolve_url(
        &self,
        storage_key: &str,
        visibility: Visibility,
        ttl: Duration,
    ) -> StorageResult<String> {
        if visibility.is_public() {
            Ok(self.public_url(storage_key))
        } else {
            self.get_presigned_url(storage_key, ttl).await
        }
    }
}
