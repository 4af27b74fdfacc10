//! Account service: registration and password login.
//!
//! Registration is gated by the pre-verified email allow-list. Login
//! accepts either a login name or an email and returns a signed token.

use serde::{Deserialize, Deserializer};

use super::credentials::{CredentialStore, Identity, NewIdentity, StoreError, UserView};
use super::guard::AuthError;
use super::password;
use super::token::TokenCodec;

/// JSON `null` reads as an empty string, so it fails the same checks as a
/// missing field.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub login: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub login_or_email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
}

/// Successful login: the resolved identity plus its fresh token.
#[derive(Debug)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub token: String,
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Create an identity for an allow-listed email.
///
/// # Errors
///
/// `EmailNotPreverified` when the email is not allow-listed (checked
/// before anything else about the request), `InvalidRequest` for a blank
/// login or password, `DuplicateEmail` / `DuplicateLogin` when the store
/// rejects the insert.
pub async fn register(store: &dyn CredentialStore, req: RegisterRequest) -> Result<UserView, AuthError> {
    let Some(email) = normalize_email(&req.email) else {
        return Err(AuthError::EmailNotPreverified);
    };
    if !store.is_preverified(&email).await? {
        tracing::info!(%email, "registration rejected: email not pre-verified");
        return Err(AuthError::EmailNotPreverified);
    }

    let login = req.login.trim();
    if login.is_empty() {
        return Err(AuthError::InvalidRequest("login is required".into()));
    }
    if req.password.is_empty() {
        return Err(AuthError::InvalidRequest("password is required".into()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let identity = store
        .create(NewIdentity {
            login: login.to_owned(),
            email,
            password_hash,
            first_name: non_blank(req.first_name),
            last_name: non_blank(req.last_name),
        })
        .await?;

    tracing::info!(user_id = identity.id, login = %identity.login, "user registered");
    Ok(UserView::from(&identity))
}

/// Look up by email when the input contains `@`, by login otherwise.
///
/// # Errors
///
/// Propagates store failures.
pub async fn resolve_login(store: &dyn CredentialStore, login_or_email: &str) -> Result<Option<Identity>, StoreError> {
    let input = login_or_email.trim();
    if input.contains('@') {
        store
            .find_by_email(&input.to_ascii_lowercase())
            .await
    } else {
        store.find_by_login(input).await
    }
}

/// Check credentials and issue a token.
///
/// # Errors
///
/// `UserNotFound` when nothing matches, `IncorrectPassword` on a hash
/// mismatch, `Internal` for store, hash or signing failures.
pub async fn login(store: &dyn CredentialStore, codec: &TokenCodec, req: &LoginRequest) -> Result<LoginOutcome, AuthError> {
    let identity = resolve_login(store, &req.login_or_email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !password::verify_password(&req.password, &identity.password_hash)? {
        tracing::info!(user_id = identity.id, "login rejected: incorrect password");
        return Err(AuthError::IncorrectPassword);
    }

    let token = codec.issue(identity.id)?;
    tracing::info!(user_id = identity.id, "login succeeded");
    Ok(LoginOutcome { identity, token })
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
