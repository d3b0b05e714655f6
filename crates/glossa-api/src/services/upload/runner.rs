//! Sequential slot runner.
//!
//! Slots are applied one at a time in plan order. Each slot runs on its own task so a
//! panic in one slot surfaces as an error instead of tearing the run down; whatever
//! happens, every file-bearing slot decrements the progress counter exactly once.

use glossa_core::models::{SlotName, SlotPatch, UploadWarning};
use glossa_core::{AppError, ErrorMetadata, Visibility};
use glossa_infra::ProgressStore;
use glossa_storage::{build_storage_key, Storage};
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinError;
use uuid::Uuid;

use super::plan::{PlannedSlot, SlotAction};
use super::sink::SlotSink;

/// Recorded for file-bearing slots that never ran because an earlier slot failed
pub const SKIPPED_MESSAGE: &str = "skipped: earlier slot failed";

/// Everything needed to apply a plan to one entity
pub struct UploadRunner {
    pub entity_id: Uuid,
    /// Storage folder of the entity type
    pub collection: &'static str,
    /// Seeds the human-readable part of new storage keys
    pub title: String,
    pub visibility: Visibility,
    pub storage: Arc<dyn Storage>,
    pub sink: Arc<dyn SlotSink>,
    /// Progress job of this run; absent when the run is not tracked
    pub progress: Option<Arc<dyn ProgressStore>>,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub warnings: Vec<UploadWarning>,
    /// First slot failure; later slots were skipped
    pub failure: Option<AppError>,
}

impl UploadRunner {
    /// Apply `plan` slot by slot, stopping at the first failure.
    #[tracing::instrument(skip(self, plan), fields(entity_id = %self.entity_id, collection = self.collection))]
    pub async fn run(self: Arc<Self>, plan: Vec<PlannedSlot>) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        for planned in plan {
            if matches!(planned.action, SlotAction::Unchanged) {
                continue;
            }
            let slot = planned.slot;
            let tracked = planned.is_tracked();

            if outcome.failure.is_some() {
                if tracked {
                    self.record_error(slot, SKIPPED_MESSAGE).await;
                    self.decrement().await;
                }
                continue;
            }

            let runner = Arc::clone(&self);
            let result = match tokio::spawn(async move { runner.process(planned).await }).await {
                Ok(result) => result,
                Err(join_error) => Err(AppError::Internal(join_error_message(join_error))),
            };

            match result {
                Ok(warnings) => outcome.warnings.extend(warnings),
                Err(error) => {
                    tracing::error!(slot = %slot, error = %error, "Slot update failed");
                    self.record_error(slot, &error.client_message()).await;
                    outcome.failure = Some(error);
                }
            }

            if tracked {
                self.decrement().await;
            }
        }

        outcome
    }

    async fn process(&self, planned: PlannedSlot) -> Result<Vec<UploadWarning>, AppError> {
        let slot = planned.slot;
        let mut warnings = Vec::new();

        match planned.action {
            SlotAction::Upload {
                file,
                previous_key,
                link_url,
                start_time,
                end_time,
            } => {
                let key = build_storage_key(
                    self.collection,
                    slot.media_kind(),
                    &self.title,
                    slot.as_str(),
                    &file.file_name,
                );
                let size = file.data.len();
                self.storage
                    .put(&key, file.data, &file.content_type, self.visibility)
                    .await?;

                let patch = if slot.has_time_markers() {
                    SlotPatch::media(key.as_str(), link_url, start_time, end_time)
                } else {
                    SlotPatch::image(key.as_str(), link_url)
                }
                .with_visibility(self.visibility);
                if let Err(error) = self.sink.apply(slot, patch).await {
                    if let Err(delete_error) = self.storage.delete(&key).await {
                        tracing::warn!(
                            slot = %slot,
                            key = %key,
                            error = %delete_error,
                            "Failed to remove object of unpersisted slot"
                        );
                    }
                    return Err(error);
                }

                tracing::info!(slot = %slot, key = %key, size = size, "Slot file stored");

                if let Some(previous_key) = previous_key.filter(|previous| *previous != key) {
                    self.remove_object(slot, &previous_key, &mut warnings).await;
                }
            }
            SlotAction::Delete {
                previous_key,
                patch,
            } => {
                self.sink.apply(slot, patch).await?;
                if !previous_key.is_empty() {
                    self.remove_object(slot, &previous_key, &mut warnings).await;
                }
                tracing::info!(slot = %slot, "Slot asset deleted");
            }
            SlotAction::UpdateMetadata { patch } => {
                self.sink.apply(slot, patch).await?;
                tracing::debug!(slot = %slot, "Slot metadata updated");
            }
            SlotAction::Unchanged => {}
        }

        Ok(warnings)
    }

    /// Best-effort object removal; a failure leaves an orphan and becomes a warning
    async fn remove_object(&self, slot: SlotName, key: &str, warnings: &mut Vec<UploadWarning>) {
        if let Err(error) = self.storage.delete(key).await {
            tracing::warn!(slot = %slot, key = %key, error = %error, "Failed to delete replaced object");
            warnings.push(UploadWarning {
                slot: slot.as_str().to_string(),
                key: key.to_string(),
                message: format!("Previous object could not be deleted: {}", error),
            });
        }
    }

    async fn record_error(&self, slot: SlotName, message: &str) {
        if let Some(progress) = &self.progress {
            if let Err(error) = progress
                .record_error(self.entity_id, slot.as_str(), message)
                .await
            {
                tracing::warn!(slot = %slot, error = %error, "Failed to record slot error");
            }
        }
    }

    async fn decrement(&self) {
        if let Some(progress) = &self.progress {
            match progress.decrement_task(self.entity_id).await {
                Ok(remaining) => tracing::debug!(remaining = remaining, "Upload progress advanced"),
                Err(error) => tracing::warn!(error = %error, "Failed to advance upload progress"),
            }
        }
    }
}

fn join_error_message(error: JoinError) -> String {
    if error.is_panic() {
        format!("Slot task panicked: {}", panic_message(error.into_panic()))
    } else {
        "Slot task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
