use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage_types::Visibility;

/// Named image attachment points of a language config.
///
/// The wire names are shared with every client and must not change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlotName {
    FullBackground,
    ClearBackground,
    ClipPart,
    Drawing,
    Icon,
    Bm,
    SignLang,
    Gif,
    Order,
}

/// Slots carried by topic documents written before the vocabulary grew to nine.
pub const LEGACY_TOPIC_IMAGE_SLOTS: [ImageSlotName; 6] = [
    ImageSlotName::FullBackground,
    ImageSlotName::ClearBackground,
    ImageSlotName::ClipPart,
    ImageSlotName::Drawing,
    ImageSlotName::Icon,
    ImageSlotName::Bm,
];

impl ImageSlotName {
    pub const ALL: [ImageSlotName; 9] = [
        ImageSlotName::FullBackground,
        ImageSlotName::ClearBackground,
        ImageSlotName::ClipPart,
        ImageSlotName::Drawing,
        ImageSlotName::Icon,
        ImageSlotName::Bm,
        ImageSlotName::SignLang,
        ImageSlotName::Gif,
        ImageSlotName::Order,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSlotName::FullBackground => "full_background",
            ImageSlotName::ClearBackground => "clear_background",
            ImageSlotName::ClipPart => "clip_part",
            ImageSlotName::Drawing => "drawing",
            ImageSlotName::Icon => "icon",
            ImageSlotName::Bm => "bm",
            ImageSlotName::SignLang => "sign_lang",
            ImageSlotName::Gif => "gif",
            ImageSlotName::Order => "order",
        }
    }
}

impl FromStr for ImageSlotName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageSlotName::ALL
            .iter()
            .copied()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown image slot: {}", s))
    }
}

impl Display for ImageSlotName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Media family of a slot; decides the storage folder and size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Folder segment used in storage keys
    pub fn folder(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Audio => "audios",
        }
    }
}

/// Any slot of a language config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotName {
    Image(ImageSlotName),
    Video,
    Audio,
}

impl SlotName {
    /// Every slot in processing order: images, then video, then audio.
    pub fn all() -> impl Iterator<Item = SlotName> {
        ImageSlotName::ALL
            .into_iter()
            .map(SlotName::Image)
            .chain([SlotName::Video, SlotName::Audio])
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::Image(name) => name.as_str(),
            SlotName::Video => "video",
            SlotName::Audio => "audio",
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        match self {
            SlotName::Image(_) => MediaKind::Image,
            SlotName::Video => MediaKind::Video,
            SlotName::Audio => MediaKind::Audio,
        }
    }

    /// Video and audio slots carry start/end markers
    pub fn has_time_markers(&self) -> bool {
        !matches!(self, SlotName::Image(_))
    }
}

impl FromStr for SlotName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(SlotName::Video),
            "audio" => Ok(SlotName::Audio),
            other => other.parse::<ImageSlotName>().map(SlotName::Image),
        }
    }
}

impl Display for SlotName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// One image attachment. An empty key means no stored asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlot {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub link_url: String,
    /// Access mode the object was stored with; decides how its URL is resolved
    #[serde(default)]
    pub visibility: Visibility,
}

/// Video or audio attachment. Start and end markers are free-form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSlot {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub link_url: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl MediaSlot {
    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }
}

impl ImageSlot {
    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }
}

/// Partial update of a single slot.
///
/// `Replace` overwrites the whole slot group; callers resupply every retained field.
/// `ClearKey` empties the storage key and keeps link and time metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPatch {
    Replace {
        key: String,
        link_url: String,
        start_time: String,
        end_time: String,
        visibility: Visibility,
    },
    ClearKey,
}

impl SlotPatch {
    pub fn image(key: impl Into<String>, link_url: impl Into<String>) -> Self {
        SlotPatch::Replace {
            key: key.into(),
            link_url: link_url.into(),
            start_time: String::new(),
            end_time: String::new(),
            visibility: Visibility::Private,
        }
    }

    pub fn media(
        key: impl Into<String>,
        link_url: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        SlotPatch::Replace {
            key: key.into(),
            link_url: link_url.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            visibility: Visibility::Private,
        }
    }

    /// Record the access mode of the object under the patched key. No-op for `ClearKey`.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        if let SlotPatch::Replace {
            visibility: current,
            ..
        } = &mut self
        {
            *current = visibility;
        }
        self
    }

    pub fn apply_to_image(&self, slot: &mut ImageSlot) {
        match self {
            SlotPatch::Replace {
                key,
                link_url,
                visibility,
                ..
            } => {
                slot.key = key.clone();
                slot.link_url = link_url.clone();
                slot.visibility = *visibility;
            }
            SlotPatch::ClearKey => slot.key.clear(),
        }
    }

    pub fn apply_to_media(&self, slot: &mut MediaSlot) {
        match self {
            SlotPatch::Replace {
                key,
                link_url,
                start_time,
                end_time,
                visibility,
            } => {
                *slot = MediaSlot {
                    key: key.clone(),
                    link_url: link_url.clone(),
                    start_time: start_time.clone(),
                    end_time: end_time.clone(),
                    visibility: *visibility,
                };
            }
            SlotPatch::ClearKey => slot.key.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_slot_names_match_wire_vocabulary() {
        let names: Vec<&str> = ImageSlotName::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "full_background",
                "clear_background",
                "clip_part",
                "drawing",
                "icon",
                "bm",
                "sign_lang",
                "gif",
                "order"
            ]
        );
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for slot in ImageSlotName::ALL {
            let json = serde_json::to_string(&slot).unwrap();
            assert_eq!(json, format!("\"{}\"", slot.as_str()));
        }
    }

    #[test]
    fn test_slot_name_parsing() {
        assert_eq!("video".parse::<SlotName>().unwrap(), SlotName::Video);
        assert_eq!(
            "sign_lang".parse::<SlotName>().unwrap(),
            SlotName::Image(ImageSlotName::SignLang)
        );
        assert!("poster".parse::<SlotName>().is_err());
    }

    #[test]
    fn test_all_slots_are_eleven() {
        assert_eq!(SlotName::all().count(), 11);
        assert!(SlotName::Audio.has_time_markers());
        assert!(!SlotName::Image(ImageSlotName::Gif).has_time_markers());
    }

    #[test]
    fn test_clear_key_preserves_metadata() {
        let mut slot = MediaSlot {
            key: "topics/videos/k".to_string(),
            link_url: "https://example.com/v".to_string(),
            start_time: "00:01".to_string(),
            end_time: "00:09".to_string(),
            visibility: Visibility::PublicRead,
        };
        SlotPatch::ClearKey.apply_to_media(&mut slot);
        assert_eq!(slot.key, "");
        assert_eq!(slot.link_url, "https://example.com/v");
        assert_eq!(slot.start_time, "00:01");
        assert_eq!(slot.end_time, "00:09");
    }

    #[test]
    fn test_replace_is_full_group_replacement() {
        let mut slot = MediaSlot {
            key: "old".to_string(),
            link_url: "old-link".to_string(),
            start_time: "1".to_string(),
            end_time: "2".to_string(),
            visibility: Visibility::PublicRead,
        };
        SlotPatch::media("new", "", "", "").apply_to_media(&mut slot);
        assert_eq!(slot, MediaSlot {
            key: "new".to_string(),
            ..MediaSlot::default()
        });
    }

    #[test]
    fn test_replace_records_visibility() {
        let mut image = ImageSlot::default();
        SlotPatch::image("topics/images/k.png", "")
            .with_visibility(Visibility::PublicRead)
            .apply_to_image(&mut image);
        assert_eq!(image.visibility, Visibility::PublicRead);

        SlotPatch::image("topics/images/k2.png", "").apply_to_image(&mut image);
        assert_eq!(image.visibility, Visibility::Private);
        assert_eq!(
            SlotPatch::ClearKey.with_visibility(Visibility::PublicRead),
            SlotPatch::ClearKey
        );
    }

    #[test]
    fn test_slots_stored_before_visibility_read_as_private() {
        let slot: MediaSlot =
            serde_json::from_str(r#"{"key":"v","link_url":"","start_time":"","end_time":""}"#)
                .unwrap();
        assert_eq!(slot.visibility, Visibility::Private);
    }
}
