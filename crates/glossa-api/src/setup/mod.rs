//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod database;
pub mod progress;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::{AppState, DbState};
use anyhow::{Context, Result};
use glossa_core::Config;
use glossa_db::PgDocumentRepository;
use glossa_db::PgVideoUploadRepository;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    glossa_infra::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        upload_mode = %config.upload_mode(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let db = DbState {
        pool: Some(pool.clone()),
        topics: Arc::new(PgDocumentRepository::topics(pool.clone())),
        vocabularies: Arc::new(PgDocumentRepository::vocabularies(pool.clone())),
        video_uploads: Arc::new(PgVideoUploadRepository::new(pool)),
    };

    let storage = storage::setup_storage(&config).await?;
    let progress = progress::setup_progress_store(&config).await?;

    let state = Arc::new(AppState::new(config, db, storage, progress));
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
