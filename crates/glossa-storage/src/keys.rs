//! Shared key generation for storage backends.
//!
//! Key format: `{collection}/{media folder}/{slug}-{slot}-{token}-{filename}`.
//! The token keeps a replacement upload from ever reusing the key it replaces.

use glossa_core::models::MediaKind;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

const MAX_SLUG_LEN: usize = 48;
const MAX_FILENAME_LEN: usize = 96;

/// Build the storage key for a slot upload.
///
/// `collection` is the entity folder (`topics`, `vocabularies`, `video-uploads`),
/// `title` seeds the human-readable slug and `filename` is the client's original name.
pub fn build_storage_key(
    collection: &str,
    media: MediaKind,
    title: &str,
    slot: &str,
    filename: &str,
) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}/{}-{}-{}-{}",
        collection,
        media.folder(),
        slugify(title),
        slot,
        &token[..8],
        sanitize_filename(filename)
    )
}

/// Lowercase ASCII slug; runs of other characters collapse into one `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Last path component of a client filename with unsafe characters replaced by `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
        .trim();
    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", ".");
    }
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        return "file".to_string();
    }
    // Keep the extension when truncating
    if cleaned.len() > MAX_FILENAME_LEN {
        let split = cleaned.len() - MAX_FILENAME_LEN;
        let cleaned = cleaned[split..].trim_start_matches('.');
        if cleaned.is_empty() {
            return "file".to_string();
        }
        return cleaned.to_string();
    }
    cleaned.to_string()
}

/// Reject keys that could escape a backend's root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.contains("..") || storage_key.starts_with('/') || storage_key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = build_storage_key("topics", MediaKind::Image, "Colors", "icon", "icon.png");
        assert!(key.starts_with("topics/images/colors-icon-"));
        assert!(key.ends_with("-icon.png"));

        let token = key
            .trim_start_matches("topics/images/colors-icon-")
            .trim_end_matches("-icon.png");
        assert_eq!(token.len(), 8);
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_keys_are_unique_per_upload() {
        let a = build_storage_key("vocabularies", MediaKind::Audio, "Red", "audio", "a.mp3");
        let b = build_storage_key("vocabularies", MediaKind::Audio, "Red", "audio", "a.mp3");
        assert_ne!(a, b);
        assert!(a.starts_with("vocabularies/audios/red-audio-"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Colors & Shapes!"), "colors-shapes");
        assert_eq!(slugify("  --Hello--World  "), "hello-world");
        assert_eq!(slugify("日本語"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\pic 1.png"), "pic_1.png");
        assert_eq!(sanitize_filename("..hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("a..b.png"), "a.b.png");
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("../secret").is_err());
        assert!(validate_key("/abs/key").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("topics/images/a.png").is_ok());
    }
}
