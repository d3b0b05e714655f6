//! Per-slot decision of what an upload request does to one slot.
//!
//! Planning is pure: it compares the request with the slot as stored and never
//! touches storage or the repository.

use glossa_core::models::{LanguageConfig, MediaSlot, SlotName, SlotPatch};

use super::request::{SlotFile, SlotRequest};

/// What happens to one slot
#[derive(Debug, Clone)]
pub enum SlotAction {
    /// Store `file` under a fresh key, persist it, then remove `previous_key`
    Upload {
        file: SlotFile,
        previous_key: Option<String>,
        link_url: String,
        start_time: String,
        end_time: String,
    },
    /// Persist `patch`, then remove the stored object
    Delete { previous_key: String, patch: SlotPatch },
    /// Persist new link or time metadata, keeping the stored object
    UpdateMetadata { patch: SlotPatch },
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct PlannedSlot {
    pub slot: SlotName,
    pub action: SlotAction,
}

impl PlannedSlot {
    /// Slots that carry a file count toward upload progress
    pub fn is_tracked(&self) -> bool {
        matches!(self.action, SlotAction::Upload { .. })
    }
}

/// Current state of a slot, as a media slot. Image slots never carry time markers.
pub fn prior_slot(config: Option<&LanguageConfig>, slot: SlotName) -> MediaSlot {
    let Some(config) = config else {
        return MediaSlot::default();
    };
    match slot {
        SlotName::Image(name) => config
            .images
            .get(&name)
            .map(|image| MediaSlot {
                key: image.key.clone(),
                link_url: image.link_url.clone(),
                visibility: image.visibility,
                ..MediaSlot::default()
            })
            .unwrap_or_default(),
        SlotName::Video => config.video.clone(),
        SlotName::Audio => config.audio.clone(),
    }
}

/// Decide the action for one slot.
///
/// A file wins over the delete flag. Supplied link and time values replace stored
/// ones; absent values keep what is stored.
pub fn plan_slot(request: &SlotRequest, prior: &MediaSlot) -> PlannedSlot {
    let link_url = request
        .link_url
        .clone()
        .unwrap_or_else(|| prior.link_url.clone());
    let (start_time, end_time) = if request.slot.has_time_markers() {
        (
            request
                .start_time
                .clone()
                .unwrap_or_else(|| prior.start_time.clone()),
            request
                .end_time
                .clone()
                .unwrap_or_else(|| prior.end_time.clone()),
        )
    } else {
        (String::new(), String::new())
    };
    let metadata_supplied = request.link_url.is_some()
        || (request.slot.has_time_markers()
            && (request.start_time.is_some() || request.end_time.is_some()));

    let action = if let Some(file) = &request.file {
        SlotAction::Upload {
            file: file.clone(),
            previous_key: prior.has_key().then(|| prior.key.clone()),
            link_url,
            start_time,
            end_time,
        }
    } else if request.delete {
        let patch = if metadata_supplied {
            SlotPatch::media("", link_url, start_time, end_time)
        } else {
            SlotPatch::ClearKey
        };
        SlotAction::Delete {
            previous_key: prior.key.clone(),
            patch,
        }
    } else if metadata_supplied {
        SlotAction::UpdateMetadata {
            patch: SlotPatch::media(prior.key.clone(), link_url, start_time, end_time)
                .with_visibility(prior.visibility),
        }
    } else {
        SlotAction::Unchanged
    };

    PlannedSlot {
        slot: request.slot,
        action,
    }
}

/// Plan every slot of a request against the stored language config
pub fn plan_slots(requests: &[SlotRequest], config: Option<&LanguageConfig>) -> Vec<PlannedSlot> {
    requests
        .iter()
        .map(|request| plan_slot(request, &prior_slot(config, request.slot)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::models::{ImageSlot, ImageSlotName, LanguageFields};
    use glossa_core::Visibility;

    const ICON: SlotName = SlotName::Image(ImageSlotName::Icon);

    fn stored_config() -> LanguageConfig {
        let mut config = LanguageConfig::new(1, LanguageFields::default());
        config.images.insert(
            ImageSlotName::Icon,
            ImageSlot {
                key: "topics/images/colors-icon-aa-icon.png".to_string(),
                link_url: "https://link".to_string(),
                visibility: Visibility::PublicRead,
            },
        );
        config.video = MediaSlot {
            key: "topics/videos/colors-video-bb-v.mp4".to_string(),
            link_url: String::new(),
            start_time: "00:01".to_string(),
            end_time: "00:05".to_string(),
            visibility: Visibility::Private,
        };
        config
    }

    #[test]
    fn test_untouched_slot_is_unchanged() {
        let config = stored_config();
        let planned = plan_slot(&SlotRequest::new(ICON), &prior_slot(Some(&config), ICON));
        assert!(matches!(planned.action, SlotAction::Unchanged));
        assert!(!planned.is_tracked());
    }

    #[test]
    fn test_file_replaces_and_keeps_link() {
        let config = stored_config();
        let request = SlotRequest::new(ICON).with_file("new.png", "image/png", vec![1, 2, 3]);
        match plan_slot(&request, &prior_slot(Some(&config), ICON)).action {
            SlotAction::Upload {
                previous_key,
                link_url,
                ..
            } => {
                assert_eq!(
                    previous_key.as_deref(),
                    Some("topics/images/colors-icon-aa-icon.png")
                );
                assert_eq!(link_url, "https://link");
            }
            other => panic!("expected upload, got {:?}", other),
        }
    }

    #[test]
    fn test_file_into_empty_slot_has_no_previous_key() {
        let request = SlotRequest::new(ICON).with_file("a.png", "image/png", vec![1]);
        match plan_slot(&request, &prior_slot(None, ICON)).action {
            SlotAction::Upload { previous_key, .. } => assert_eq!(previous_key, None),
            other => panic!("expected upload, got {:?}", other),
        }
    }

    #[test]
    fn test_file_wins_over_delete_flag() {
        let request = SlotRequest::new(ICON)
            .with_file("a.png", "image/png", vec![1])
            .deleted();
        let planned = plan_slot(&request, &MediaSlot::default());
        assert!(planned.is_tracked());
    }

    #[test]
    fn test_bare_delete_clears_key_only() {
        let config = stored_config();
        let request = SlotRequest::new(SlotName::Video).deleted();
        match plan_slot(&request, &prior_slot(Some(&config), SlotName::Video)).action {
            SlotAction::Delete {
                previous_key,
                patch,
            } => {
                assert_eq!(previous_key, "topics/videos/colors-video-bb-v.mp4");
                assert_eq!(patch, SlotPatch::ClearKey);
            }
            other => panic!("expected delete, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_with_metadata_replaces_group() {
        let config = stored_config();
        let request = SlotRequest::new(SlotName::Video)
            .deleted()
            .with_times("00:02", "00:03");
        match plan_slot(&request, &prior_slot(Some(&config), SlotName::Video)).action {
            SlotAction::Delete { patch, .. } => {
                assert_eq!(patch, SlotPatch::media("", "", "00:02", "00:03"));
            }
            other => panic!("expected delete, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_only_keeps_key() {
        let config = stored_config();
        let request = SlotRequest::new(SlotName::Video).with_link_url("https://yt/v");
        match plan_slot(&request, &prior_slot(Some(&config), SlotName::Video)).action {
            SlotAction::UpdateMetadata { patch } => assert_eq!(
                patch,
                SlotPatch::media(
                    "topics/videos/colors-video-bb-v.mp4",
                    "https://yt/v",
                    "00:01",
                    "00:05"
                )
            ),
            other => panic!("expected metadata update, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_only_keeps_visibility() {
        let config = stored_config();
        let request = SlotRequest::new(ICON).with_link_url("https://other");
        match plan_slot(&request, &prior_slot(Some(&config), ICON)).action {
            SlotAction::UpdateMetadata { patch } => assert_eq!(
                patch,
                SlotPatch::image("topics/images/colors-icon-aa-icon.png", "https://other")
                    .with_visibility(Visibility::PublicRead)
            ),
            other => panic!("expected metadata update, got {:?}", other),
        }
    }

    #[test]
    fn test_time_markers_ignored_on_image_slots() {
        let request = SlotRequest::new(ICON).with_times("1", "2");
        let planned = plan_slot(&request, &MediaSlot::default());
        assert!(matches!(planned.action, SlotAction::Unchanged));
    }

    #[test]
    fn test_plan_covers_every_requested_slot() {
        let requests: Vec<SlotRequest> = SlotName::all().map(SlotRequest::new).collect();
        let plan = plan_slots(&requests, None);
        assert_eq!(plan.len(), 11);
        assert!(plan
            .iter()
            .all(|p| matches!(p.action, SlotAction::Unchanged)));
    }
}
