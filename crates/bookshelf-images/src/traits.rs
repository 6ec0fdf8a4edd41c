//! Image store trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Image store errors.
#[derive(Error, Debug)]
pub enum ImageStoreError {
    /// API error from the hosting service.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL does not reference an image on this provider.
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A successfully uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Stable public URL of the hosted image.
    pub url: String,
    /// Provider-side identifier used for later deletion.
    pub public_id: String,
}

/// Image hosting provider.
///
/// Implementations own URL recognition for their service: callers ask
/// `hosts(url)` before requesting deletion instead of inspecting the
/// URL themselves.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Whether this provider hosts the image at the given URL.
    fn hosts(&self, url: &str) -> bool;

    /// Upload image data (a data URI or remote URL) and return the
    /// hosted URL.
    async fn upload(&self, data: &str) -> Result<UploadedImage, ImageStoreError>;

    /// Delete the image at the given URL from the provider.
    async fn delete(&self, url: &str) -> Result<(), ImageStoreError>;
}
