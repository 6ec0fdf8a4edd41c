//! API error taxonomy and HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use bookshelf_core::{StoreError, ValidationError};

/// API errors, one variant per failure class the HTTP surface exposes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or incomplete input (400).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Uniqueness violation (400).
    #[error("{0}")]
    Conflict(String),

    /// Bad login credentials (400). The message is identical for an
    /// unknown email and a wrong password so callers cannot probe
    /// which accounts exist.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, or expired bearer token (401).
    #[error("{0}")]
    Token(String),

    /// Authenticated but not allowed to touch this resource (403).
    #[error("{0}")]
    Forbidden(String),

    /// Resource absent (404).
    #[error("{0}")]
    NotFound(String),

    /// External image store failure (500).
    #[error("{0}")]
    Upstream(String),

    /// Unexpected failure (500). The detail is logged, never returned.
    #[error("Internal server error")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailExists | StoreError::UsernameExists => {
                Self::Conflict(err.to_string())
            }
            StoreError::InvalidCredentials => Self::InvalidCredentials,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::Conflict(_) | Self::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let Self::Internal(detail) = &self {
            tracing::error!(%detail, "internal server error");
        }

        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
