//! Configuration loading and validation.
//!
//! JSON5 format. Config location: `~/.bookshelf/bookshelf.json`.
//! Secrets can be supplied via `BOOKSHELF_*` environment variables,
//! which override values from the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default token lifetime in days.
const DEFAULT_TOKEN_EXPIRY_DAYS: u64 = 15;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON5 parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] json5::Error),

    /// Config validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Cloudinary image hosting configuration. When absent, images are
    /// kept in an in-process store (local development only).
    #[serde(default)]
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be loaded or parsed.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a path.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Self::state_dir().join("bookshelf.json")
    }

    /// Get the Bookshelf state directory.
    ///
    /// Uses `BOOKSHELF_STATE_DIR` env var if set, otherwise `~/.bookshelf`.
    #[must_use]
    pub fn state_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("BOOKSHELF_STATE_DIR") {
            PathBuf::from(dir)
        } else if let Some(home) = dirs::home_dir() {
            home.join(".bookshelf")
        } else {
            PathBuf::from(".bookshelf")
        }
    }

    /// Get the persistent data directory.
    #[must_use]
    pub fn data_dir() -> PathBuf {
        Self::state_dir().join("data")
    }

    /// Apply environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var("BOOKSHELF_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }

        let cloud_name = std::env::var("BOOKSHELF_CLOUDINARY_CLOUD_NAME").ok();
        let api_key = std::env::var("BOOKSHELF_CLOUDINARY_API_KEY").ok();
        let api_secret = std::env::var("BOOKSHELF_CLOUDINARY_API_SECRET").ok();
        if let (Some(cloud_name), Some(api_key), Some(api_secret)) =
            (cloud_name, api_key, api_secret)
        {
            self.cloudinary = Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                base_url: self.cloudinary.and_then(|c| c.base_url),
            });
        }

        self
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.auth.token_expiry_days == 0 {
            return Err(ConfigError::Validation(
                "Token expiry must be at least one day".to_string(),
            ));
        }

        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind_address: String,

    /// Enable CORS.
    #[serde(default = "default_true")]
    pub cors: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind(),
            cors: true,
            timeout_secs: default_timeout(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// JWT signing secret (hex-encoded). Auto-generated if not set.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Session token lifetime in days.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_days: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry_days: default_token_expiry(),
        }
    }
}

impl AuthConfig {
    /// Get the token lifetime as a Duration.
    #[must_use]
    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.token_expiry_days * 24 * 3600)
    }
}

/// Cloudinary image hosting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudinaryConfig {
    /// Cloud name identifying the account.
    pub cloud_name: String,

    /// API key.
    pub api_key: String,

    /// API secret.
    pub api_secret: String,

    /// Base URL override (for testing against a stub).
    #[serde(default)]
    pub base_url: Option<String>,
}

const fn default_port() -> u16 {
    3000
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

const fn default_timeout() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

const fn default_token_expiry() -> u64 {
    DEFAULT_TOKEN_EXPIRY_DAYS
}
