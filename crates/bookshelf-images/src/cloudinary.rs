//! Cloudinary image hosting provider.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::traits::{ImageStore, ImageStoreError, UploadedImage};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

/// Cloudinary API provider.
pub struct CloudinaryStore {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl CloudinaryStore {
    /// Create a new Cloudinary provider.
    #[must_use]
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create with a custom API base URL (for testing against a stub).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{action}", self.base_url, self.cloud_name)
    }
}

/// Derive the provider-side public id from a hosted image URL.
///
/// Cloudinary delivery URLs end in `<public_id>.<ext>`; the id is the
/// last path segment with the extension stripped.
fn public_id_from_url(url: &str) -> Result<String, ImageStoreError> {
    let parsed = Url::parse(url).map_err(|_| ImageStoreError::InvalidUrl(url.to_string()))?;
    let last = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ImageStoreError::InvalidUrl(url.to_string()))?;

    let public_id = match last.rsplit_once('.') {
        Some((id, _ext)) if !id.is_empty() => id,
        _ => last,
    };
    Ok(public_id.to_string())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    fn name(&self) -> &str {
        "cloudinary"
    }

    fn hosts(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .is_some_and(|host| host == "cloudinary.com" || host.ends_with(".cloudinary.com"))
    }

    async fn upload(&self, data: &str) -> Result<UploadedImage, ImageStoreError> {
        let response = self
            .client
            .post(self.endpoint("upload"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .form(&[("file", data)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ImageStoreError::Api { status, message });
        }

        let result: UploadResponse = response.json().await?;
        Ok(UploadedImage {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }

    async fn delete(&self, url: &str) -> Result<(), ImageStoreError> {
        let public_id = public_id_from_url(url)?;

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .form(&[("public_id", public_id.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ImageStoreError::Api { status, message });
        }

        let result: DestroyResponse = response.json().await?;
        if result.result != "ok" {
            return Err(ImageStoreError::Api {
                status: 200,
                message: format!("destroy returned {:?} for {public_id}", result.result),
            });
        }

        tracing::debug!(%public_id, "deleted hosted image");
        Ok(())
    }
}

impl std::fmt::Debug for CloudinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryStore")
            .field("cloud_name", &self.cloud_name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CloudinaryStore {
        CloudinaryStore::new("demo", "key", "secret")
    }

    #[test]
    fn test_hosts_cloudinary_urls() {
        let store = store();
        assert!(store.hosts("https://res.cloudinary.com/demo/image/upload/v1/abc123.png"));
        assert!(store.hosts("https://cloudinary.com/abc.jpg"));
        assert!(!store.hosts("https://example.com/cloudinary/abc.jpg"));
        assert!(!store.hosts("https://notcloudinary.com/abc.jpg"));
        assert!(!store.hosts("not a url"));
    }

    #[test]
    fn test_public_id_from_url() {
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/v1/abc123.png")
                .unwrap(),
            "abc123"
        );
        // No extension
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/abc123").unwrap(),
            "abc123"
        );
        assert!(public_id_from_url("not a url").is_err());
        assert!(public_id_from_url("https://res.cloudinary.com/").is_err());
    }

    #[test]
    fn test_endpoints() {
        let store = store();
        assert_eq!(
            store.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        let stubbed = CloudinaryStore::new("demo", "key", "secret")
            .with_base_url("http://127.0.0.1:9999");
        assert_eq!(
            stubbed.endpoint("destroy"),
            "http://127.0.0.1:9999/v1_1/demo/image/destroy"
        );
    }
}
