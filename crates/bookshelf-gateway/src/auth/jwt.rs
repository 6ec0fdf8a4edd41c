//! Session token management.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Codec for issuing and verifying signed session tokens.
///
/// Tokens are stateless: verification is signature plus expiry only,
/// and there is no revocation before expiry. Logout is a client-side
/// discard.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenCodec {
    /// Create a new codec with a secret key and token lifetime.
    ///
    /// The secret should be at least 32 bytes.
    #[must_use]
    pub fn new(secret: &[u8], expiry: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry,
        }
    }

    /// Create a codec from a hex-encoded secret.
    ///
    /// # Errors
    ///
    /// Returns error if hex decoding fails.
    pub fn from_hex_secret(hex_secret: &str, expiry: Duration) -> Result<Self, ApiError> {
        let secret = hex::decode(hex_secret)
            .map_err(|e| ApiError::Internal(format!("Invalid hex secret: {e}")))?;
        Ok(Self::new(&secret, expiry))
    }

    /// Generate a random 256-bit secret key.
    #[must_use]
    pub fn generate_secret() -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Generate a random secret as a hex string.
    #[must_use]
    pub fn generate_hex_secret() -> String {
        hex::encode(Self::generate_secret())
    }

    /// Issue a session token for the given subject.
    ///
    /// # Errors
    ///
    /// Returns error if the configured lifetime is not representable
    /// or token encoding fails.
    pub fn issue(&self, subject: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(self.expiry)
            .map_err(|e| ApiError::Internal(format!("Token lifetime out of range: {e}")))?;
        let exp = now + lifetime;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Token encoding failed: {e}")))
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    ///
    /// Returns error if the signature does not validate or the token
    /// has expired.
    pub fn verify(&self, token: &str) -> Result<String, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)
            .map_err(|_| ApiError::Token("Invalid or expired token".to_string()))?;

        Ok(token_data.claims.sub)
    }

    /// Extract the token from an authorization header value.
    ///
    /// Expects format: "Bearer <token>"
    #[must_use]
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIFTEEN_DAYS: Duration = Duration::from_secs(15 * 86400);

    fn create_codec() -> TokenCodec {
        TokenCodec::new(&TokenCodec::generate_secret(), FIFTEEN_DAYS)
    }

    #[test]
    fn test_generate_secret() {
        let secret1 = TokenCodec::generate_secret();
        let secret2 = TokenCodec::generate_secret();
        assert_ne!(secret1, secret2);
        assert_eq!(secret1.len(), 32);
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = create_codec();
        let token = codec.issue("user_123").unwrap();

        assert!(!token.is_empty());
        assert_eq!(codec.verify(&token).unwrap(), "user_123");
    }

    #[test]
    fn test_expiry_fifteen_days_out() {
        let secret = TokenCodec::generate_secret();
        let codec = TokenCodec::new(&secret, FIFTEEN_DAYS);
        let token = codec.issue("user_123").unwrap();

        let mut validation = Validation::default();
        validation.leeway = 0;
        let data: TokenData<Claims> =
            decode(&token, &DecodingKey::from_secret(&secret), &validation).unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 15 * 86400);
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = TokenCodec::generate_secret();
        let codec = TokenCodec::new(&secret, FIFTEEN_DAYS);

        // Forge a token whose expiry is in the past, signed with the
        // same secret
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user_123".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&secret),
        )
        .unwrap();

        assert!(codec.verify(&expired).is_err());
    }

    #[test]
    fn test_unrepresentable_lifetime_rejected() {
        // A lifetime chrono cannot represent must fail, not silently
        // issue an already-expired token
        let codec = TokenCodec::new(
            &TokenCodec::generate_secret(),
            Duration::from_secs(u64::MAX),
        );
        assert!(codec.issue("user_123").is_err());
    }

    #[test]
    fn test_invalid_token() {
        let codec = create_codec();
        assert!(codec.verify("invalid.token.here").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec_a = create_codec();
        let codec_b = create_codec();
        let token = codec_a.issue("user_123").unwrap();
        assert!(codec_b.verify(&token).is_err());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(
            TokenCodec::extract_from_header("Bearer abc123"),
            Some("abc123")
        );
        assert_eq!(
            TokenCodec::extract_from_header("bearer abc123"),
            Some("abc123")
        );
        assert_eq!(TokenCodec::extract_from_header("abc123"), None);
    }

    #[test]
    fn test_hex_secret() {
        let hex_secret = TokenCodec::generate_hex_secret();
        assert_eq!(hex_secret.len(), 64);

        let codec = TokenCodec::from_hex_secret(&hex_secret, FIFTEEN_DAYS).unwrap();
        let token = codec.issue("user_123").unwrap();
        assert_eq!(codec.verify(&token).unwrap(), "user_123");
    }
}
