//! HTTP route handlers.

pub mod auth;
pub mod books;

/// Health check handler.
pub async fn health() -> &'static str {
    "OK"
}
