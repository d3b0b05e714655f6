use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Progress value reported when no upload job exists for an entity.
pub const PROGRESS_IDLE: i32 = -1;

/// Percentage of dispatched work items of an upload job.
///
/// Returns [`PROGRESS_IDLE`] when `total` is zero or negative, so "nothing in progress"
/// stays distinct from "just started".
pub fn progress_percent(total: i64, remaining: i64) -> i32 {
    if total <= 0 {
        return PROGRESS_IDLE;
    }
    let done = (total - remaining).max(0);
    let percent = done.saturating_mul(100) / total;
    percent.min(100) as i32
}

/// Per-slot failures of an upload job, grouped the way clients render them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadErrors {
    pub audio_error: Option<String>,
    pub video_error: Option<String>,
    pub image_error: BTreeMap<String, String>,
}

impl UploadErrors {
    /// Split a raw slot → message map into audio, video and image errors
    pub fn from_slot_map(errors: HashMap<String, String>) -> Self {
        let mut grouped = UploadErrors::default();
        for (slot, message) in errors {
            match slot.as_str() {
                "audio" => grouped.audio_error = Some(message),
                "video" => grouped.video_error = Some(message),
                _ => {
                    grouped.image_error.insert(slot, message);
                }
            }
        }
        grouped
    }

    pub fn is_empty(&self) -> bool {
        self.audio_error.is_none() && self.video_error.is_none() && self.image_error.is_empty()
    }
}

/// Snapshot returned by the upload-progress endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadProgress {
    /// -1 when no job is known, otherwise 0..=100
    pub progress: i32,
    pub file_name: String,
    pub errors: UploadErrors,
}

impl UploadProgress {
    pub fn idle() -> Self {
        UploadProgress {
            progress: PROGRESS_IDLE,
            file_name: String::new(),
            errors: UploadErrors::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_job_is_idle_sentinel() {
        assert_eq!(progress_percent(0, 0), -1);
        assert_eq!(progress_percent(-3, 0), -1);
    }

    #[test]
    fn test_fresh_job_is_zero() {
        assert_eq!(progress_percent(3, 3), 0);
    }

    #[test]
    fn test_percentage_floors() {
        assert_eq!(progress_percent(3, 2), 33);
        assert_eq!(progress_percent(3, 1), 66);
        assert_eq!(progress_percent(3, 0), 100);
    }

    #[test]
    fn test_percentage_is_clamped() {
        assert_eq!(progress_percent(2, -1), 100);
        assert_eq!(progress_percent(2, 5), 0);
    }

    #[test]
    fn test_errors_grouping() {
        let mut raw = HashMap::new();
        raw.insert("audio".to_string(), "timeout".to_string());
        raw.insert("icon".to_string(), "put failed".to_string());
        raw.insert("gif".to_string(), "skipped".to_string());

        let grouped = UploadErrors::from_slot_map(raw);
        assert_eq!(grouped.audio_error.as_deref(), Some("timeout"));
        assert_eq!(grouped.video_error, None);
        assert_eq!(grouped.image_error.len(), 2);
        assert_eq!(grouped.image_error["icon"], "put failed");
    }
}
