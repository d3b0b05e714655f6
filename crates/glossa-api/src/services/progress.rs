//! Upload progress reporting.
//!
//! A finished job is reported once: the read that observes 100% also clears the
//! job, so the next read reports no job at all. The clear is conditional, so a
//! job restarted between the read and the clear survives.

use glossa_core::models::{progress_percent, UploadErrors, UploadProgress, PROGRESS_IDLE};
use glossa_core::AppError;
use glossa_infra::ProgressStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<dyn ProgressStore>,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Current progress of the upload job of `id`
    #[tracing::instrument(skip(self), fields(entity_id = %id))]
    pub async fn report(&self, id: Uuid) -> Result<UploadProgress, AppError> {
        let total = self.store.get_total(id).await?;
        let remaining = self.store.get_remaining(id).await?;
        let progress = progress_percent(total, remaining);
        if progress == PROGRESS_IDLE {
            return Ok(UploadProgress::idle());
        }

        let errors = self.store.get_errors(id).await?;
        let file_name = self.store.get_file_name(id).await?;

        if progress >= 100 {
            let cleared = self.store.clear_finished_job(id, total).await?;
            tracing::debug!(
                cleared,
                failed_slots = errors.len(),
                "Finished upload job reported"
            );
        }

        Ok(UploadProgress {
            progress,
            file_name,
            errors: UploadErrors::from_slot_map(errors),
        })
    }
}
