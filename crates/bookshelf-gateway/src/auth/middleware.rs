//! Authorization gate for protected routes.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use axum::response::{IntoResponse, Response};

use bookshelf_core::config::AuthConfig;
use bookshelf_core::{User, UserStore};

use super::jwt::TokenCodec;
use crate::GatewayError;
use crate::error::ApiError;

/// Shared authentication state.
pub struct AuthState {
    /// Session token codec.
    pub tokens: TokenCodec,
    /// User store.
    pub users: UserStore,
}

impl AuthState {
    /// Create a new auth state.
    #[must_use]
    pub fn new(tokens: TokenCodec, users: UserStore) -> Self {
        Self { tokens, users }
    }

    /// Initialize auth state, auto-generating a signing secret if the
    /// configuration carries none.
    ///
    /// # Errors
    ///
    /// Returns error if the user store cannot be opened or the
    /// configured secret is not valid hex.
    pub fn initialize(config: &AuthConfig, db: &sled::Db) -> Result<Self, GatewayError> {
        let users = UserStore::open(db)?;

        let secret = match &config.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                // Fresh secret per process: existing tokens stop
                // verifying on restart
                tracing::info!("No JWT secret configured, generated an ephemeral one");
                TokenCodec::generate_hex_secret()
            }
        };

        let tokens = TokenCodec::from_hex_secret(&secret, config.token_expiry())
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self::new(tokens, users))
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("users", &self.users)
            .finish_non_exhaustive()
    }
}

/// Extractor for authenticated requests.
///
/// Use this in handler parameters to require a valid bearer token.
/// The wrapped [`User`] is the persisted record the token's subject
/// resolved to; downstream code never re-verifies the token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<AuthState>: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthState>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::Token("Authentication required".to_string()).into_response()
            })?;

        let token = TokenCodec::extract_from_header(header).ok_or_else(|| {
            ApiError::Token("Invalid authorization header".to_string()).into_response()
        })?;

        let subject = auth.tokens.verify(token).map_err(IntoResponse::into_response)?;

        let user = auth
            .users
            .get(&subject)
            .map_err(|e| ApiError::from(e).into_response())?
            .ok_or_else(|| ApiError::Token("User not found".to_string()).into_response())?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;

    use bookshelf_core::store::users::default_avatar;

    #[derive(Clone)]
    struct TestState(Arc<AuthState>);

    impl FromRef<TestState> for Arc<AuthState> {
        fn from_ref(state: &TestState) -> Self {
            state.0.clone()
        }
    }

    fn auth_state() -> (TestState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = bookshelf_core::open_db(dir.path()).unwrap();
        let tokens = TokenCodec::new(
            &TokenCodec::generate_secret(),
            Duration::from_secs(15 * 86400),
        );
        let state = AuthState::new(tokens, UserStore::open(&db).unwrap());
        (TestState(Arc::new(state)), dir)
    }

    fn request_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/books");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_resolves_valid_token_to_user() {
        let (state, _dir) = auth_state();

        let user = User::new(
            "reader",
            "reader@example.com",
            "password123",
            default_avatar("reader"),
        )
        .unwrap();
        state.0.users.create(&user).unwrap();
        let token = state.0.tokens.issue(&user.id).unwrap();

        let mut parts = request_with_auth(Some(&format!("Bearer {token}")));
        let current = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(current.0.id, user.id);
        assert_eq!(current.0.username, "reader");
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let (state, _dir) = auth_state();
        let mut parts = request_with_auth(None);
        let rejection = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(rejection.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_header_rejected() {
        let (state, _dir) = auth_state();
        let mut parts = request_with_auth(Some("Token abc123"));
        let rejection = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(rejection.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (state, _dir) = auth_state();
        let mut parts = request_with_auth(Some("Bearer not.a.token"));
        let rejection = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(rejection.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let (state, _dir) = auth_state();
        // Valid signature, but the subject was never persisted
        let token = state.0.tokens.issue("user_ghost").unwrap();
        let mut parts = request_with_auth(Some(&format!("Bearer {token}")));
        let rejection = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(rejection.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
