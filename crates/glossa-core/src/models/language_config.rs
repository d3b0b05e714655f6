use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::slot::{ImageSlot, ImageSlotName, MediaSlot, SlotName, SlotPatch};
use crate::storage_types::Visibility;

/// Display text of one language config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct LanguageFields {
    #[validate(length(max = 255))]
    #[serde(default)]
    pub file_name: String,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub description: String,
}

/// Per-language bundle of display text and media slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub language_id: i32,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: BTreeMap<ImageSlotName, ImageSlot>,
    #[serde(default)]
    pub video: MediaSlot,
    #[serde(default)]
    pub audio: MediaSlot,
}

impl LanguageConfig {
    /// New config with the given text and every image slot present with an empty key
    pub fn new(language_id: i32, fields: LanguageFields) -> Self {
        let mut config = LanguageConfig {
            language_id,
            file_name: fields.file_name,
            title: fields.title,
            note: fields.note,
            description: fields.description,
            images: BTreeMap::new(),
            video: MediaSlot::default(),
            audio: MediaSlot::default(),
        };
        config.ensure_all_image_slots();
        config
    }

    /// Fill in any image slot missing from an older document. Returns true if anything was added.
    pub fn ensure_all_image_slots(&mut self) -> bool {
        let before = self.images.len();
        for slot in ImageSlotName::ALL {
            self.images.entry(slot).or_default();
        }
        self.images.len() != before
    }

    pub fn set_fields(&mut self, fields: LanguageFields) {
        self.file_name = fields.file_name;
        self.title = fields.title;
        self.note = fields.note;
        self.description = fields.description;
    }

    pub fn fields(&self) -> LanguageFields {
        LanguageFields {
            file_name: self.file_name.clone(),
            title: self.title.clone(),
            note: self.note.clone(),
            description: self.description.clone(),
        }
    }

    /// Current storage key of a slot, empty when nothing is stored
    pub fn slot_key(&self, slot: SlotName) -> &str {
        match slot {
            SlotName::Image(name) => self
                .images
                .get(&name)
                .map(|image| image.key.as_str())
                .unwrap_or(""),
            SlotName::Video => &self.video.key,
            SlotName::Audio => &self.audio.key,
        }
    }

    /// Apply a patch to exactly one slot, creating the slot if the document predates it.
    pub fn apply_patch(&mut self, slot: SlotName, patch: &SlotPatch) {
        match slot {
            SlotName::Image(name) => patch.apply_to_image(self.images.entry(name).or_default()),
            SlotName::Video => patch.apply_to_media(&mut self.video),
            SlotName::Audio => patch.apply_to_media(&mut self.audio),
        }
    }

    /// Every non-empty storage key referenced by this config
    pub fn stored_keys(&self) -> Vec<String> {
        self.stored_objects().into_iter().map(|(key, _)| key).collect()
    }

    /// Every non-empty storage key with the visibility it was stored with
    pub fn stored_objects(&self) -> Vec<(String, Visibility)> {
        self.images
            .values()
            .map(|image| (image.key.as_str(), image.visibility))
            .chain([
                (self.video.key.as_str(), self.video.visibility),
                (self.audio.key.as_str(), self.audio.visibility),
            ])
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, visibility)| (key.to_string(), visibility))
            .collect()
    }
}
