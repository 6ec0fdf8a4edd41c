//! # Bookshelf Gateway
//!
//! HTTP API server for the Bookshelf book-review backend.
//!
//! Routes:
//! - `POST /auth/register`, `POST /auth/login` — identity issuance
//! - `POST /books`, `GET /books`, `GET /books/user`,
//!   `DELETE /books/{id}` — ownership-scoped book entries
//! - `GET /health`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Route handlers.
pub mod api;
/// Token codec and authorization gate.
pub mod auth;
mod error;
mod server;

pub use auth::{AuthState, CurrentUser, TokenCodec};
pub use error::ApiError;
pub use server::{AppState, Gateway, GatewayBuilder, GatewayConfig};

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Server error.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] bookshelf_core::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the gateway server.
///
/// # Errors
///
/// Returns error if the server fails to start.
pub async fn start(config: GatewayConfig) -> Result<(), GatewayError> {
    let gateway = GatewayBuilder::new().with_config(config).build()?;
    gateway.run().await
}
