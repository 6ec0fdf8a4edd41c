//! In-process image store for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::traits::{ImageStore, ImageStoreError, UploadedImage};

const BASE_URL: &str = "https://images.bookshelf.test";

/// In-memory image store.
///
/// Hands out stable fake URLs and supports failure injection so
/// callers can exercise their upload- and delete-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    images: Mutex<HashMap<String, String>>,
    next_id: AtomicU64,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent uploads fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent deletions fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::Relaxed);
    }

    /// Number of images currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the store holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn hosts(&self, url: &str) -> bool {
        url.starts_with(BASE_URL)
    }

    async fn upload(&self, data: &str) -> Result<UploadedImage, ImageStoreError> {
        if self.fail_uploads.load(Ordering::Relaxed) {
            return Err(ImageStoreError::Api {
                status: 503,
                message: "upload failure injected".to_string(),
            });
        }

        let public_id = format!("img_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let url = format!("{BASE_URL}/{public_id}.png");
        self.images
            .lock()
            .map_err(|_| ImageStoreError::Config("image map lock poisoned".to_string()))?
            .insert(url.clone(), data.to_string());

        Ok(UploadedImage { url, public_id })
    }

    async fn delete(&self, url: &str) -> Result<(), ImageStoreError> {
        if self.fail_deletes.load(Ordering::Relaxed) {
            return Err(ImageStoreError::Api {
                status: 503,
                message: "delete failure injected".to_string(),
            });
        }

        self.images
            .lock()
            .map_err(|_| ImageStoreError::Config("image map lock poisoned".to_string()))?
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| ImageStoreError::InvalidUrl(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_delete() {
        let store = MemoryStore::new();
        let uploaded = store.upload("data:image/png;base64,AAAA").await.unwrap();

        assert!(store.hosts(&uploaded.url));
        assert_eq!(store.len(), 1);

        store.delete(&uploaded.url).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_urls_are_distinct() {
        let store = MemoryStore::new();
        let a = store.upload("a").await.unwrap();
        let b = store.upload("b").await.unwrap();
        assert_ne!(a.url, b.url);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();

        store.fail_uploads(true);
        assert!(store.upload("data").await.is_err());
        store.fail_uploads(false);

        let uploaded = store.upload("data").await.unwrap();
        store.fail_deletes(true);
        assert!(store.delete(&uploaded.url).await.is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_url() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.delete("https://images.bookshelf.test/missing.png").await,
            Err(ImageStoreError::InvalidUrl(_))
        ));
    }
}
