//! Multi-slot upload orchestration
//!
//! `request` parses the multipart form, `plan` decides what happens to each slot,
//! `runner` applies the plan and `service` ties it to entities, leases and progress.

pub mod plan;
pub mod request;
pub mod runner;
pub mod service;
pub mod sink;

pub use request::{SlotFile, SlotRequest, UploadRequest, VideoUploadRequest};
pub use service::{DocumentUploadService, VideoUploadService};
