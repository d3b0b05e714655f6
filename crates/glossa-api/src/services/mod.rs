//! Services layer: upload orchestration, progress reporting and URL resolution

pub mod media_urls;
pub mod progress;
pub mod upload;
