//! Temporary object URLs for in-memory media
//!
//! Recorded takes, offline tracks and rendered exports live in memory as
//! [`MediaBlob`]s. A consumer that needs something it can hand to a media
//! element gets an [`ObjectUrl`]: a `blob:reelcut/<uuid>` reference that
//! resolves back to the bytes through the [`BlobUrlRegistry`] until it is
//! revoked. Dropping the handle revokes the URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const URL_PREFIX: &str = "blob:reelcut/";

/// Encoded media bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
}

impl MediaBlob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Concatenate encoded chunks into a single blob
    pub fn from_chunks(chunks: Vec<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        let total = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk);
        }
        Self::new(bytes, mime_type)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Registry of live object URLs
#[derive(Debug, Clone, Default)]
pub struct BlobUrlRegistry {
    blobs: Arc<Mutex<HashMap<String, MediaBlob>>>,
}

impl BlobUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blob and return the handle that owns its URL
    pub fn create(&self, blob: MediaBlob) -> ObjectUrl {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(url.clone(), blob);
        }
        ObjectUrl {
            url,
            registry: self.clone(),
        }
    }

    /// Look up the blob behind a URL, None once revoked
    pub fn resolve(&self, url: &str) -> Option<MediaBlob> {
        self.blobs.lock().ok()?.get(url).cloned()
    }

    /// Release a URL; unknown URLs are ignored
    pub fn revoke(&self, url: &str) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.remove(url);
        }
    }

    /// Number of URLs currently alive
    pub fn live_count(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }
}

/// Owned temporary URL; revoked when dropped
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: BlobUrlRegistry,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Bytes behind this URL
    pub fn blob(&self) -> Option<MediaBlob> {
        self.registry.resolve(&self.url)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let registry = BlobUrlRegistry::new();
        let url = registry.create(MediaBlob::new(vec![1, 2, 3], "audio/webm"));

        assert!(url.as_str().starts_with("blob:reelcut/"));
        let blob = registry.resolve(url.as_str()).unwrap();
        assert_eq!(blob.bytes.as_slice(), &[1, 2, 3]);
        assert_eq!(blob.mime_type, "audio/webm");
    }

    #[test]
    fn test_drop_revokes() {
        let registry = BlobUrlRegistry::new();
        let url = registry.create(MediaBlob::new(vec![0; 4], "audio/mpeg"));
        let raw = url.as_str().to_string();
        assert_eq!(registry.live_count(), 1);

        drop(url);
        assert_eq!(registry.live_count(), 0);
        assert!(registry.resolve(&raw).is_none());
    }

    #[test]
    fn test_from_chunks_concatenates() {
        let blob = MediaBlob::from_chunks(vec![vec![1, 2], vec![], vec![3]], "audio/webm");
        assert_eq!(blob.bytes.as_slice(), &[1, 2, 3]);
        assert_eq!(blob.len(), 3);
    }

    #[test]
    fn test_revoke_unknown_is_noop() {
        let registry = BlobUrlRegistry::new();
        registry.revoke("blob:reelcut/missing");
        assert_eq!(registry.live_count(), 0);
    }
}
