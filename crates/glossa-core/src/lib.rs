//! Glossa Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every Glossa component: the language-config documents (topics and vocabularies),
//! the fixed media slot vocabulary, slot patches and upload-progress arithmetic.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, ServiceConfig, UploadMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::{StorageBackend, Visibility};
// Note: Storage, StorageError, StorageResult live in the glossa-storage crate
