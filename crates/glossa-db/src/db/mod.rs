//! Database repositories for data access layer
//!
//! Documents (topics and vocabularies) share one table and one repository
//! implementation; video uploads have their own.

pub mod document;
pub mod video_upload;

pub use document::{MediaDocumentRepository, PgDocumentRepository};
pub use video_upload::{PgVideoUploadRepository, VideoUploadRepository};
