//! Glossa Storage Library
//!
//! This crate provides the object store abstraction used for slot media and
//! implementations for S3 (via `object_store`) and the local filesystem.
//!
//! # Storage key format
//!
//! All backends share one key layout, built by the `keys` module:
//!
//! `{collection}/{media folder}/{slug}-{slot}-{token}-{filename}`
//!
//! e.g. `topics/images/colors-icon-3f2a9c1d-icon.png`. Keys must not contain `..`
//! or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use glossa_core::{StorageBackend, Visibility};
pub use keys::build_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
