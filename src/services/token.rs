//! Token codec: issue and verify signed identity tokens.
//!
//! ARCHITECTURE
//! ============
//! Tokens are HS256 JWTs carrying `{id, iat, exp}`. Nothing is stored
//! server-side: every request re-verifies the presented string, so a token
//! stays valid for its full lifetime. The signing secret is injected from
//! `JWT_SECRET` at startup.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::hours(6);

const SECRET_VAR: &str = "JWT_SECRET";

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id.
    pub id: i64,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
    #[error("missing signing secret: env var {var} not set")]
    MissingSecret { var: String },
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies tokens with a shared HMAC secret. Cheap to clone.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Arc<Keys>,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let keys = Keys { encoding: EncodingKey::from_secret(secret), decoding: DecodingKey::from_secret(secret) };
        Self { keys: Arc::new(keys) }
    }

    /// Build from `JWT_SECRET`. Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::MissingSecret`] if the variable is unset or blank.
    pub fn from_env() -> Result<Self, TokenError> {
        let secret = std::env::var(SECRET_VAR)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TokenError::MissingSecret { var: SECRET_VAR.into() })?;
        Ok(Self::new(secret.as_bytes()))
    }

    /// Issue a token for `id` using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encode`] if signing fails.
    pub fn issue(&self, id: i64) -> Result<String, TokenError> {
        self.issue_at(id, OffsetDateTime::now_utc())
    }

    /// Issue a token for `id` as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encode`] if signing fails.
    pub fn issue_at(&self, id: i64, now: OffsetDateTime) -> Result<String, TokenError> {
        let claims = Claims { id, iat: now.unix_timestamp(), exp: (now + TOKEN_TTL).unix_timestamp() };
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?)
    }

    /// Verify `token` against the system clock.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::verify_at`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Verify `token` as if the current time were `now`.
    ///
    /// The signature is checked before the expiry, so a forged token never
    /// reports [`TokenError::Expired`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Malformed`] for unparseable or badly signed
    /// tokens, [`TokenError::Expired`] once `now` is past `exp`.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against `now` below, not the library's clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.keys.decoding, &validation)
            .map_err(|_| TokenError::Malformed)?;

        if now.unix_timestamp() > data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
