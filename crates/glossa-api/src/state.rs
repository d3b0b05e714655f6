//! Application state and sub-state types.
//!
//! AppState is split into domain sub-states so handlers and services only reach for
//! what they need. Every collaborator sits behind a trait object so tests can swap in
//! in-memory implementations.

use glossa_core::models::{DocumentKind, ImageSlotName, MediaKind};
use glossa_core::{Config, UploadMode};
use glossa_db::{MediaDocumentRepository, VideoUploadRepository};
use glossa_infra::ProgressStore;
use glossa_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Database pool and repositories.
#[derive(Clone)]
pub struct DbState {
    /// Absent when the repositories are not backed by PostgreSQL
    pub pool: Option<PgPool>,
    pub topics: Arc<dyn MediaDocumentRepository>,
    pub vocabularies: Arc<dyn MediaDocumentRepository>,
    pub video_uploads: Arc<dyn VideoUploadRepository>,
}

impl DbState {
    pub fn documents(&self, kind: DocumentKind) -> Arc<dyn MediaDocumentRepository> {
        match kind {
            DocumentKind::Topic => self.topics.clone(),
            DocumentKind::Vocabulary => self.vocabularies.clone(),
        }
    }
}

/// Object storage and per-media size limits.
#[derive(Clone)]
pub struct MediaConfig {
    pub storage: Arc<dyn Storage>,
    pub signed_url_ttl: Duration,
    pub image_max_file_size: usize,
    pub video_max_file_size: usize,
    pub audio_max_file_size: usize,
}

impl MediaConfig {
    pub fn max_file_size(&self, media: MediaKind) -> usize {
        match media {
            MediaKind::Image => self.image_max_file_size,
            MediaKind::Video => self.video_max_file_size,
            MediaKind::Audio => self.audio_max_file_size,
        }
    }

    /// Largest body a document upload may need: every image slot, the video and
    /// the audio at their limits, plus room for the text fields
    pub fn max_request_size(&self) -> usize {
        const FORM_OVERHEAD: usize = 1024 * 1024;
        self.image_max_file_size
            .saturating_mul(ImageSlotName::ALL.len())
            .saturating_add(self.video_max_file_size)
            .saturating_add(self.audio_max_file_size)
            .saturating_add(FORM_OVERHEAD)
    }
}

/// Progress counters, leases and how upload runs are driven.
#[derive(Clone)]
pub struct UploadState {
    pub progress: Arc<dyn ProgressStore>,
    pub mode: UploadMode,
    pub lease_ttl: Duration,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub media: MediaConfig,
    pub upload: UploadState,
}

impl AppState {
    pub fn new(
        config: Config,
        db: DbState,
        storage: Arc<dyn Storage>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        let media = MediaConfig {
            storage,
            signed_url_ttl: Duration::from_secs(config.signed_url_ttl_secs()),
            image_max_file_size: config.max_image_size_bytes(),
            video_max_file_size: config.max_video_size_bytes(),
            audio_max_file_size: config.max_audio_size_bytes(),
        };
        let upload = UploadState {
            progress,
            mode: config.upload_mode(),
            lease_ttl: Duration::from_secs(config.upload_lease_ttl_secs()),
        };
        Self {
            config,
            db,
            media,
            upload,
        }
    }
}
