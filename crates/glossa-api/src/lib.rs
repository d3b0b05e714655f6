//! Glossa API Library
//!
//! This crate provides the HTTP API handlers, middleware, upload services and application setup.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
mod services;
pub mod setup;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::progress::ProgressReporter;
pub use services::upload::{DocumentUploadService, SlotFile, SlotRequest, UploadRequest};
