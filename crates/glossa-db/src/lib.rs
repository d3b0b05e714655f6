//! Glossa Database Layer
//!
//! This crate provides the PostgreSQL repositories for language-config documents
//! and video uploads. Migrations live in the workspace `migrations/` directory.

// Module declarations
pub mod db;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-exports: repositories and their traits
pub use db::{
    MediaDocumentRepository, PgDocumentRepository, PgVideoUploadRepository,
    VideoUploadRepository,
};
