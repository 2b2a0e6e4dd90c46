pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::User;

pub use password::{hash_password, verify_password, PasswordError};

/// Shortest signing secret accepted at startup.
pub const MIN_SECRET_LEN: usize = 32;

/// Well-known defaults that must never sign production tokens.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "",
    "secret",
    "replace_me",
    "changeme",
    "your-secret-key",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("secret must be at least 32 characters")]
    SecretTooShort,

    #[error("secret must not be a placeholder value")]
    PlaceholderSecret,

    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Bad signature, expiry, wrong algorithm and malformed input all collapse here.
    #[error("invalid or expired token")]
    Invalid,
}

/// Identity attached to authenticated requests; never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            username: claims.username,
            email: claims.email,
        }
    }
}

/// Check that a signing secret is strong enough to start the server with
pub fn validate_secret(secret: &str) -> Result<(), TokenError> {
    let trimmed = secret.trim();
    if PLACEHOLDER_SECRETS
        .iter()
        .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
    {
        return Err(TokenError::PlaceholderSecret);
    }
    if secret.chars().count() < MIN_SECRET_LEN {
        return Err(TokenError::SecretTooShort);
    }
    Ok(())
}

/// Issues and verifies HS256 session tokens.
///
/// The secret is handed in at construction and never read from global state.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Result<Self, TokenError> {
        validate_secret(secret)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        })
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.encode_claims(&Claims::new(user, self.ttl))
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token rejected: {}", e);
                TokenError::Invalid
            })
    }
}
