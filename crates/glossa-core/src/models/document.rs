use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::language_config::{LanguageConfig, LanguageFields};
use super::slot::{ImageSlot, MediaSlot, SlotName, SlotPatch};
use crate::storage_types::Visibility;

/// Which collection a language-config document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Topic,
    Vocabulary,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Topic => "topic",
            DocumentKind::Vocabulary => "vocabulary",
        }
    }

    /// Top-level storage folder and route segment
    pub fn collection(&self) -> &'static str {
        match self {
            DocumentKind::Topic => "topics",
            DocumentKind::Vocabulary => "vocabularies",
        }
    }

    /// Capitalised name for error messages
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Topic => "Topic",
            DocumentKind::Vocabulary => "Vocabulary",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "topic" | "topics" => Ok(DocumentKind::Topic),
            "vocabulary" | "vocabularies" => Ok(DocumentKind::Vocabulary),
            _ => Err(anyhow::anyhow!("Invalid document kind: {}", s)),
        }
    }
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A topic or vocabulary entry with its language configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDocument {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub organization_id: Uuid,
    /// Parent topic of a vocabulary entry
    pub topic_id: Option<Uuid>,
    pub is_published: bool,
    pub language_configs: Vec<LanguageConfig>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a document
#[derive(Debug, Clone)]
pub struct NewMediaDocument {
    /// Generated when absent
    pub id: Option<Uuid>,
    pub kind: DocumentKind,
    pub organization_id: Uuid,
    pub topic_id: Option<Uuid>,
    pub is_published: bool,
    pub created_by: Uuid,
}

impl MediaDocument {
    pub fn language_config(&self, language_id: i32) -> Option<&LanguageConfig> {
        self.language_configs
            .iter()
            .find(|config| config.language_id == language_id)
    }

    fn language_config_entry(&mut self, language_id: i32) -> &mut LanguageConfig {
        let index = match self
            .language_configs
            .iter()
            .position(|config| config.language_id == language_id)
        {
            Some(index) => index,
            None => {
                self.language_configs
                    .push(LanguageConfig::new(language_id, LanguageFields::default()));
                self.language_configs.len() - 1
            }
        };
        &mut self.language_configs[index]
    }

    /// Overwrite the text of an existing language config or append a new one.
    ///
    /// Either way the config exposes the full image slot vocabulary afterwards.
    pub fn upsert_language_config(
        &mut self,
        language_id: i32,
        fields: LanguageFields,
    ) -> &mut LanguageConfig {
        let config = self.language_config_entry(language_id);
        config.set_fields(fields);
        config.ensure_all_image_slots();
        config
    }

    /// Apply a slot patch, creating the language config and slot if they do not exist yet.
    pub fn apply_slot_patch(&mut self, language_id: i32, slot: SlotName, patch: &SlotPatch) {
        let config = self.language_config_entry(language_id);
        config.ensure_all_image_slots();
        config.apply_patch(slot, patch);
    }

    /// Current key of a slot, empty when the language or slot is absent
    pub fn slot_key(&self, language_id: i32, slot: SlotName) -> &str {
        self.language_config(language_id)
            .map(|config| config.slot_key(slot))
            .unwrap_or("")
    }

    /// Every storage key referenced by the document
    pub fn stored_keys(&self) -> Vec<String> {
        self.language_configs
            .iter()
            .flat_map(LanguageConfig::stored_keys)
            .collect()
    }

    /// Every storage key with the visibility it was stored with
    pub fn stored_objects(&self) -> Vec<(String, Visibility)> {
        self.language_configs
            .iter()
            .flat_map(LanguageConfig::stored_objects)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageSlotView {
    pub key: String,
    pub link_url: String,
    pub visibility: Visibility,
    /// Resolved access URL; computed on read, never stored
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MediaSlotView {
    pub key: String,
    pub link_url: String,
    pub start_time: String,
    pub end_time: String,
    pub visibility: Visibility,
    /// Resolved access URL; computed on read, never stored
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LanguageConfigView {
    pub language_id: i32,
    pub file_name: String,
    pub title: String,
    pub note: String,
    pub description: String,
    pub images: BTreeMap<String, ImageSlotView>,
    pub video: MediaSlotView,
    pub audio: MediaSlotView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MediaDocumentView {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub organization_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<Uuid>,
    pub is_published: bool,
    pub language_configs: Vec<LanguageConfigView>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn resolved(urls: &HashMap<String, String>, key: &str) -> Option<String> {
    if key.is_empty() {
        None
    } else {
        urls.get(key).cloned()
    }
}

impl ImageSlotView {
    pub fn build(slot: &ImageSlot, urls: &HashMap<String, String>) -> Self {
        ImageSlotView {
            key: slot.key.clone(),
            link_url: slot.link_url.clone(),
            visibility: slot.visibility,
            url: resolved(urls, &slot.key),
        }
    }
}

impl MediaSlotView {
    pub fn build(slot: &MediaSlot, urls: &HashMap<String, String>) -> Self {
        MediaSlotView {
            key: slot.key.clone(),
            link_url: slot.link_url.clone(),
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            visibility: slot.visibility,
            url: resolved(urls, &slot.key),
        }
    }
}

impl LanguageConfigView {
    /// Build the client view. Older configs missing slots are shown with empty ones.
    pub fn build(config: &LanguageConfig, urls: &HashMap<String, String>) -> Self {
        let mut healed = config.clone();
        healed.ensure_all_image_slots();
        LanguageConfigView {
            language_id: healed.language_id,
            images: healed
                .images
                .iter()
                .map(|(name, slot)| (name.as_str().to_string(), ImageSlotView::build(slot, urls)))
                .collect(),
            video: MediaSlotView::build(&healed.video, urls),
            audio: MediaSlotView::build(&healed.audio, urls),
            file_name: healed.file_name,
            title: healed.title,
            note: healed.note,
            description: healed.description,
        }
    }
}

impl MediaDocumentView {
    /// `urls` maps storage keys to their resolved access URLs
    pub fn build(document: &MediaDocument, urls: &HashMap<String, String>) -> Self {
        MediaDocumentView {
            id: document.id,
            kind: document.kind,
            organization_id: document.organization_id,
            topic_id: document.topic_id,
            is_published: document.is_published,
            language_configs: document
                .language_configs
                .iter()
                .map(|config| LanguageConfigView::build(config, urls))
                .collect(),
            created_by: document.created_by,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}
