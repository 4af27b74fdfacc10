//! Auth guard: turns a presented token into a resolved identity.
//!
//! The guard is channel-agnostic: route extractors pull the token from a
//! cookie or a header and hand it to [`authorize`]. It never dispatches to
//! the protected operation itself.

use axum::http::StatusCode;

use super::credentials::{CredentialStore, Identity, StoreError, UniqueField};
use super::password::PasswordError;
use super::token::{TokenCodec, TokenError};
use crate::error::ErrorCode;

/// Every failure the auth and session flow surfaces to callers.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token not provided")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token has expired")]
    TokenExpired,
    #[error("token does not match any user")]
    UnknownIdentity,
    #[error("user not found")]
    UserNotFound,
    #[error("incorrect password")]
    IncorrectPassword,
    #[error("email not verified or not allowed for registration")]
    EmailNotPreverified,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("login already taken")]
    DuplicateLogin,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "E_MISSING_TOKEN",
            Self::InvalidToken => "E_INVALID_TOKEN",
            Self::TokenExpired => "E_TOKEN_EXPIRED",
            Self::UnknownIdentity => "E_UNKNOWN_IDENTITY",
            Self::UserNotFound => "E_USER_NOT_FOUND",
            Self::IncorrectPassword => "E_INCORRECT_PASSWORD",
            Self::EmailNotPreverified => "E_EMAIL_NOT_PREVERIFIED",
            Self::DuplicateEmail => "E_DUPLICATE_EMAIL",
            Self::DuplicateLogin => "E_DUPLICATE_LOGIN",
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
            Self::Internal(_) => "E_INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::UnknownIdentity
            | Self::UserNotFound
            | Self::IncorrectPassword => StatusCode::UNAUTHORIZED,
            Self::EmailNotPreverified | Self::DuplicateEmail | Self::DuplicateLogin | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Malformed => Self::InvalidToken,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(UniqueField::Email) => Self::DuplicateEmail,
            StoreError::Duplicate(UniqueField::Login) => Self::DuplicateLogin,
            StoreError::Db(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Resolve the identity behind `presented`.
///
/// # Errors
///
/// `MissingToken` for an absent or blank token, `TokenExpired` /
/// `InvalidToken` from verification, `UnknownIdentity` when the id no
/// longer resolves, `Internal` when the store fails.
pub async fn authorize(
    store: &dyn CredentialStore,
    codec: &TokenCodec,
    presented: Option<&str>,
) -> Result<Identity, AuthError> {
    let token = presented
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = codec.verify(token)?;

    store
        .find_by_id(claims.id)
        .await?
        .ok_or(AuthError::UnknownIdentity)
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
