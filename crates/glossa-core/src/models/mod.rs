//! Data models for the application
//!
//! This module contains the language-config documents, their media slots,
//! standalone video uploads and the upload progress model.

mod document;
mod language_config;
mod progress;
mod slot;
mod upload;
mod video_upload;

// Re-export all models for convenient imports
pub use document::*;
pub use language_config::*;
pub use progress::*;
pub use slot::*;
pub use upload::*;
pub use video_upload::*;
