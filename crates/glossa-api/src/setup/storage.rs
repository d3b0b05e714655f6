//! Storage setup and initialization

use anyhow::{Context, Result};
use glossa_core::Config;
use glossa_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize object storage")?;
    tracing::info!(
        backend = ?storage.backend_type(),
        signed_url_ttl_secs = config.signed_url_ttl_secs(),
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}
