//! Gateway server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use bookshelf_core::config::{AuthConfig, Config};
use bookshelf_core::{BookStore, open_db};
use bookshelf_images::{ImageStore, MemoryStore};

use crate::GatewayError;
use crate::api;
use crate::auth::AuthState;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port to listen on.
    pub port: u16,
    /// Bind address.
    pub bind_address: String,
    /// Enable CORS.
    pub cors: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Data directory for persistent storage.
    pub data_dir: PathBuf,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "127.0.0.1".to_string(),
            cors: true,
            timeout_secs: 30,
            data_dir: Config::data_dir(),
            auth: AuthConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Build a gateway configuration from a loaded [`Config`].
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            port: config.server.port,
            bind_address: config.server.bind_address.clone(),
            cors: config.server.cors,
            timeout_secs: config.server.timeout_secs,
            data_dir: Config::data_dir(),
            auth: config.auth.clone(),
        }
    }
}

/// Shared state handed to every handler.
#[derive(Clone, FromRef)]
pub struct AppState {
    /// Authentication state (token codec + user store).
    pub auth: Arc<AuthState>,
    /// Book store.
    pub books: Arc<BookStore>,
    /// Configured image hosting provider.
    pub images: Arc<dyn ImageStore>,
}

/// Gateway server.
pub struct Gateway {
    config: GatewayConfig,
    state: AppState,
}

/// Builder for constructing a Gateway with its dependencies.
pub struct GatewayBuilder {
    config: GatewayConfig,
    images: Option<Arc<dyn ImageStore>>,
}

impl GatewayBuilder {
    /// Create a new builder with default config.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            images: None,
        }
    }

    /// Set gateway configuration.
    #[must_use]
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the image hosting provider.
    #[must_use]
    pub fn with_image_store(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = Some(images);
        self
    }

    /// Build the gateway.
    ///
    /// # Errors
    ///
    /// Returns error if the data directory or stores cannot be opened.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        std::fs::create_dir_all(&self.config.data_dir)
            .map_err(|e| GatewayError::Config(format!("Failed to create data dir: {e}")))?;

        let db = open_db(&self.config.data_dir)?;
        let auth = Arc::new(AuthState::initialize(&self.config.auth, &db)?);
        let books = Arc::new(BookStore::open(&db)?);

        let images = self.images.unwrap_or_else(|| {
            tracing::warn!("No image provider configured, using in-process store");
            Arc::new(MemoryStore::new())
        });

        Ok(Gateway {
            config: self.config,
            state: AppState {
                auth,
                books,
                images,
            },
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway {
    /// Build the API router.
    #[must_use]
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/health", get(api::health))
            .route("/auth/register", post(api::auth::register))
            .route("/auth/login", post(api::auth::login))
            .route("/books", post(api::books::create).get(api::books::list))
            .route("/books/user", get(api::books::list_mine))
            .route("/books/{id}", delete(api::books::remove))
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeout_secs,
            )))
            .with_state(self.state.clone());

        if self.config.cors {
            app = app.layer(CorsLayer::permissive());
        }

        app
    }

    /// Run the gateway server until it fails or is shut down.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot bind or the server fails.
    pub async fn run(&self) -> Result<(), GatewayError> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| GatewayError::Config(format!("Invalid address: {e}")))?;

        tracing::info!("Bookshelf API listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router())
            .await
            .map_err(|e| GatewayError::Server(e.to_string()))
    }
}
