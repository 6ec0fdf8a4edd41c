//! Registration and login handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use bookshelf_core::store::users::default_avatar;
use bookshelf_core::validation::{
    ValidationError, validate_email, validate_password, validate_username,
};
use bookshelf_core::{PublicUser, User};

use crate::error::ApiError;
use crate::server::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Desired username.
    pub username: Option<String>,
    /// Email address used for login.
    pub email: Option<String>,
    /// Plaintext password; hashed before it is persisted.
    pub password: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
}

/// Successful registration or login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Signed session token.
    pub token: String,
    /// Publicly-viewable fields of the account.
    pub user: PublicUser,
}

fn require(field: Option<String>) -> Result<String, ApiError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ValidationError::MissingFields.into()),
    }
}

/// `POST /auth/register`
///
/// Validates the fields, enforces email-then-username uniqueness,
/// derives the default avatar, persists the account with the password
/// hashed, and issues a session token.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let username = require(body.username)?;
    let email = require(body.email)?;
    let password = require(body.password)?;

    validate_password(&password)?;
    let username = validate_username(&username)?;
    let email = validate_email(&email)?;

    // Email checked before username so a caller colliding on both
    // always sees the email conflict
    if state.auth.users.get_by_email(&email)?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }
    if state.auth.users.get_by_username(&username)?.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let profile_image = default_avatar(&username);
    let user = User::new(&username, &email, &password, profile_image)?;
    state.auth.users.create(&user)?;

    let token = state.auth.tokens.issue(&user.id)?;
    tracing::info!(user_id = %user.id, %username, "registered new user");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.to_public(),
        }),
    ))
}

/// `POST /auth/login`
///
/// Verifies the password against the stored hash and issues a fresh
/// session token. An unknown email and a wrong password produce the
/// identical error.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = require(body.email)?;
    let password = require(body.password)?;

    let email = bookshelf_core::validation::normalize_email(&email);
    let user = state
        .auth
        .users
        .get_by_email(&email)?
        .ok_or(ApiError::InvalidCredentials)?;

    user.verify_password(&password)?;

    let token = state.auth.tokens.issue(&user.id)?;
    tracing::debug!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        token,
        user: user.to_public(),
    }))
}
