//! Progress counter store setup

use anyhow::{Context, Result};
use glossa_core::Config;
use glossa_infra::{MemoryProgressStore, ProgressStore, RedisProgressStore};
use std::sync::Arc;

/// Redis when `REDIS_URL` is set, otherwise an in-process store.
///
/// The in-process store only works for a single replica: progress and leases are
/// not shared between instances.
pub async fn setup_progress_store(config: &Config) -> Result<Arc<dyn ProgressStore>> {
    match config.redis_url() {
        Some(url) => {
            let store = RedisProgressStore::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            store
                .ping()
                .await
                .context("Redis did not answer PING")?;
            tracing::info!("Progress store connected to Redis");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!(
                "REDIS_URL not set - using in-memory progress store; upload progress and leases are local to this instance"
            );
            Ok(Arc::new(MemoryProgressStore::new()))
        }
    }
}
