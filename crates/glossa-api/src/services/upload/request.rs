//! Multipart upload forms
//!
//! A document upload carries display text plus, for every slot, an optional file,
//! link URL and delete flag:
//!
//! - `<slot>_file`, `<slot>_link_url`, `is_deleted_<slot>` for the 9 image slots,
//!   `video` and `audio`
//! - `video_start`, `video_end`, `audio_start`, `audio_end` time markers

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use bytes::Bytes;
use glossa_core::models::{LanguageFields, SlotName};
use glossa_core::{AppError, Visibility};
use uuid::Uuid;
use validator::Validate;

use crate::error::multipart_error;
use crate::state::MediaConfig;

/// A file attached to one slot
#[derive(Debug, Clone)]
pub struct SlotFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// What the caller asked for one slot. Absent fields keep their stored value.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub slot: SlotName,
    pub file: Option<SlotFile>,
    pub link_url: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub delete: bool,
}

impl SlotRequest {
    pub fn new(slot: SlotName) -> Self {
        Self {
            slot,
            file: None,
            link_url: None,
            start_time: None,
            end_time: None,
            delete: false,
        }
    }

    pub fn with_file(mut self, file_name: &str, content_type: &str, data: impl Into<Bytes>) -> Self {
        self.file = Some(SlotFile {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data: data.into(),
        });
        self
    }

    pub fn with_link_url(mut self, link_url: &str) -> Self {
        self.link_url = Some(link_url.to_string());
        self
    }

    pub fn with_times(mut self, start_time: &str, end_time: &str) -> Self {
        self.start_time = Some(start_time.to_string());
        self.end_time = Some(end_time.to_string());
        self
    }

    pub fn deleted(mut self) -> Self {
        self.delete = true;
        self
    }
}

/// Upload of one language config of a topic or vocabulary entry
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Existing entity to update; a new entity is created when absent
    pub id: Option<Uuid>,
    pub language_id: i32,
    pub fields: LanguageFields,
    /// Publication flag; kept as stored when absent on update
    pub is_published: Option<bool>,
    /// Parent topic of a vocabulary entry
    pub topic_id: Option<Uuid>,
    pub visibility: Visibility,
    /// One entry per known slot, in [`SlotName::all`] order
    pub slots: Vec<SlotRequest>,
}

impl UploadRequest {
    pub fn new(id: Option<Uuid>, language_id: i32, fields: LanguageFields) -> Self {
        Self {
            id,
            language_id,
            fields,
            is_published: None,
            topic_id: None,
            visibility: Visibility::Private,
            slots: SlotName::all().map(SlotRequest::new).collect(),
        }
    }

    /// Replace the request for `request.slot`
    pub fn with_slot(mut self, request: SlotRequest) -> Self {
        if let Some(entry) = self.slots.iter_mut().find(|s| s.slot == request.slot) {
            *entry = request;
        }
        self
    }

    fn slot_mut(&mut self, slot: SlotName) -> &mut SlotRequest {
        let index = self
            .slots
            .iter()
            .position(|s| s.slot == slot)
            .unwrap_or_else(|| {
                self.slots.push(SlotRequest::new(slot));
                self.slots.len() - 1
            });
        &mut self.slots[index]
    }

    /// Read the multipart form, enforcing per-media size limits.
    pub async fn from_multipart(
        mut multipart: Multipart,
        limits: &MediaConfig,
    ) -> Result<Self, AppError> {
        let mut request = UploadRequest::new(None, 0, LanguageFields::default());
        let mut language_id: Option<i32> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(|s| s.to_string()).unwrap_or_default();

            if let Some((slot, part)) = parse_slot_field(&name) {
                match part {
                    SlotField::File => {
                        let max = limits.max_file_size(slot.media_kind());
                        if let Some(file) = read_file(field, max).await? {
                            let entry = request.slot_mut(slot);
                            if entry.file.is_some() {
                                return Err(AppError::InvalidInput(format!(
                                    "Multiple files sent for slot '{}'",
                                    slot
                                )));
                            }
                            entry.file = Some(file);
                        }
                    }
                    SlotField::LinkUrl => request.slot_mut(slot).link_url = Some(read_text(field).await?),
                    SlotField::Delete => {
                        request.slot_mut(slot).delete = parse_bool(&name, &read_text(field).await?)?
                    }
                    SlotField::Start => request.slot_mut(slot).start_time = Some(read_text(field).await?),
                    SlotField::End => request.slot_mut(slot).end_time = Some(read_text(field).await?),
                }
                continue;
            }

            match name.as_str() {
                "id" => request.id = parse_optional_uuid("id", &read_text(field).await?)?,
                "language_id" => {
                    let value = read_text(field).await?;
                    let parsed = value.trim().parse::<i32>().map_err(|_| {
                        AppError::InvalidInput(format!("Invalid language_id '{}'", value))
                    })?;
                    language_id = Some(parsed);
                }
                "is_published" => {
                    request.is_published = Some(parse_bool(&name, &read_text(field).await?)?)
                }
                "topic_id" => {
                    request.topic_id = parse_optional_uuid("topic_id", &read_text(field).await?)?
                }
                "visibility" => request.visibility = parse_visibility(&read_text(field).await?)?,
                "file_name" => request.fields.file_name = read_text(field).await?,
                "title" => request.fields.title = read_text(field).await?,
                "note" => request.fields.note = read_text(field).await?,
                "description" => request.fields.description = read_text(field).await?,
                _ => tracing::debug!(field = %name, "Ignoring unknown multipart field"),
            }
        }

        request.language_id = match language_id {
            Some(id) if id > 0 => id,
            Some(id) => {
                return Err(AppError::InvalidInput(format!(
                    "language_id must be positive, got {}",
                    id
                )))
            }
            None => return Err(AppError::InvalidInput("language_id is required".to_string())),
        };
        request.fields.validate()?;

        Ok(request)
    }
}

/// Upload or update of a standalone video
#[derive(Debug, Clone)]
pub struct VideoUploadRequest {
    pub id: Option<Uuid>,
    /// Required when creating
    pub title: Option<String>,
    pub visibility: Visibility,
    pub video: SlotRequest,
}

impl VideoUploadRequest {
    pub fn new(id: Option<Uuid>, title: Option<&str>) -> Self {
        Self {
            id,
            title: title.map(String::from),
            visibility: Visibility::Private,
            video: SlotRequest::new(SlotName::Video),
        }
    }

    /// Read the multipart form: `id`, `title`, `file`, `link_url`, `start`, `end`, `is_deleted`.
    pub async fn from_multipart(
        mut multipart: Multipart,
        limits: &MediaConfig,
    ) -> Result<Self, AppError> {
        let mut request = VideoUploadRequest::new(None, None);

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(|s| s.to_string()).unwrap_or_default();
            match name.as_str() {
                "id" => request.id = parse_optional_uuid("id", &read_text(field).await?)?,
                "title" => request.title = Some(read_text(field).await?),
                "visibility" => request.visibility = parse_visibility(&read_text(field).await?)?,
                "file" => {
                    if let Some(file) = read_file(field, limits.video_max_file_size).await? {
                        if request.video.file.is_some() {
                            return Err(AppError::InvalidInput(
                                "Multiple file fields are not allowed; send exactly one field named 'file'"
                                    .to_string(),
                            ));
                        }
                        request.video.file = Some(file);
                    }
                }
                "link_url" => request.video.link_url = Some(read_text(field).await?),
                "start" => request.video.start_time = Some(read_text(field).await?),
                "end" => request.video.end_time = Some(read_text(field).await?),
                "is_deleted" => request.video.delete = parse_bool(&name, &read_text(field).await?)?,
                _ => tracing::debug!(field = %name, "Ignoring unknown multipart field"),
            }
        }

        if let Some(title) = &request.title {
            if title.chars().count() > 255 {
                return Err(AppError::InvalidInput(
                    "title must be at most 255 characters".to_string(),
                ));
            }
        }

        Ok(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotField {
    File,
    LinkUrl,
    Delete,
    Start,
    End,
}

fn parse_slot_field(name: &str) -> Option<(SlotName, SlotField)> {
    if let Some(slot) = name.strip_prefix("is_deleted_") {
        return slot.parse().ok().map(|slot| (slot, SlotField::Delete));
    }
    if let Some(slot) = name.strip_suffix("_file") {
        return slot.parse().ok().map(|slot| (slot, SlotField::File));
    }
    if let Some(slot) = name.strip_suffix("_link_url") {
        return slot.parse().ok().map(|slot| (slot, SlotField::LinkUrl));
    }
    match name {
        "video_start" => Some((SlotName::Video, SlotField::Start)),
        "video_end" => Some((SlotName::Video, SlotField::End)),
        "audio_start" => Some((SlotName::Audio, SlotField::Start)),
        "audio_end" => Some((SlotName::Audio, SlotField::End)),
        _ => None,
    }
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

/// Read a file part. Browsers send an empty, nameless part for an untouched file input;
/// that counts as no file.
async fn read_file(field: Field<'_>, max_size: usize) -> Result<Option<SlotFile>, AppError> {
    let file_name = field.file_name().map(|s: &str| s.to_string()).unwrap_or_default();
    let content_type = field
        .content_type()
        .map(|s: &str| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

    let data = field.bytes().await.map_err(multipart_error)?;

    if data.is_empty() {
        if file_name.is_empty() {
            return Ok(None);
        }
        return Err(AppError::InvalidInput(format!(
            "File '{}' in field '{}' is empty",
            file_name, field_name
        )));
    }
    validate_file_size(data.len(), max_size)?;

    Ok(Some(SlotFile {
        file_name: if file_name.is_empty() {
            "file".to_string()
        } else {
            file_name
        },
        content_type,
        data,
    }))
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

fn parse_bool(field: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::InvalidInput(format!(
            "Invalid boolean '{}' for field '{}'",
            other, field
        ))),
    }
}

fn parse_optional_uuid(field: &str, value: &str) -> Result<Option<Uuid>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(value)
        .map(Some)
        .map_err(|_| AppError::InvalidInput(format!("Invalid {} '{}'", field, value)))
}

fn parse_visibility(value: &str) -> Result<Visibility, AppError> {
    match value.trim().to_lowercase().as_str() {
        "" | "private" => Ok(Visibility::Private),
        "public" | "public-read" | "public_read" => Ok(Visibility::PublicRead),
        other => Err(AppError::InvalidInput(format!(
            "Invalid visibility '{}'. Must be 'private' or 'public-read'",
            other
        ))),
    }
}
