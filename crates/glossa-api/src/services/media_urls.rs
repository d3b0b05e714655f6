//! Read-time URL resolution for stored keys

use glossa_core::Visibility;
use glossa_storage::Storage;
use std::collections::HashMap;
use std::time::Duration;

/// Access URL for every non-empty key: the public URL for objects stored public-read,
/// a signed URL otherwise. Keys that cannot be resolved are left out and render
/// without a URL.
pub async fn resolve_urls(
    storage: &dyn Storage,
    objects: Vec<(String, Visibility)>,
    ttl: Duration,
) -> HashMap<String, String> {
    let mut urls = HashMap::new();
    for (key, visibility) in objects {
        if key.is_empty() || urls.contains_key(&key) {
            continue;
        }
        match storage.resolve_url(&key, visibility, ttl).await {
            Ok(url) => {
                urls.insert(key, url);
            }
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "Failed to resolve URL for stored key");
            }
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_storage::test_helpers::MockStorage;

    #[tokio::test]
    async fn test_resolves_each_key_once() {
        let storage = MockStorage::new();
        let urls = resolve_urls(
            &storage,
            vec![
                ("topics/images/a.png".to_string(), Visibility::Private),
                (String::new(), Visibility::Private),
                ("topics/images/a.png".to_string(), Visibility::Private),
            ],
            Duration::from_secs(60),
        )
        .await;

        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls["topics/images/a.png"],
            "https://example.com/presigned/topics/images/a.png"
        );
    }

    #[tokio::test]
    async fn test_public_objects_resolve_to_public_url() {
        let storage = MockStorage::new();
        let urls = resolve_urls(
            &storage,
            vec![
                ("topics/images/open.png".to_string(), Visibility::PublicRead),
                ("topics/images/closed.png".to_string(), Visibility::Private),
            ],
            Duration::from_secs(60),
        )
        .await;

        assert_eq!(
            urls["topics/images/open.png"],
            "https://example.com/topics/images/open.png"
        );
        assert_eq!(
            urls["topics/images/closed.png"],
            "https://example.com/presigned/topics/images/closed.png"
        );
    }
}
