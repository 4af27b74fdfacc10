//! Auth routes: register, password login, current user, logout.
//!
//! Tokens reach the server over two channels. Browser clients carry the
//! `jwt` cookie set at login; other clients send the raw token in the
//! `Authorization` header. Both extractors run the same guard.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::error::{ErrorCode, error_response};
use crate::services::account::{self, LoginRequest, RegisterRequest};
use crate::services::credentials::{Identity, UserView};
use crate::services::guard::{self, AuthError};
use crate::services::token::TOKEN_TTL;
use crate::state::AppState;

pub const JWT_COOKIE: &str = "jwt";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "auth request failed");
        } else {
            tracing::debug!(code = self.error_code(), "auth request rejected");
        }
        error_response(&self)
    }
}

fn jwt_cookie(value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((JWT_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(max_age)
        .build()
}

/// Token from `Authorization: <token>`. A `Bearer ` prefix is tolerated.
pub(crate) fn header_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    Some(raw.strip_prefix("Bearer ").map_or(raw, str::trim_start))
}

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

/// Identity resolved from the `jwt` cookie.
pub struct CookieUser {
    pub identity: Identity,
}

impl<S> axum::extract::FromRequestParts<S> for CookieUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let app_state = AppState::from_ref(state);
        let identity =
            guard::authorize(app_state.store.as_ref(), &app_state.tokens, jar.get(JWT_COOKIE).map(Cookie::value))
                .await?;
        Ok(Self { identity })
    }
}

/// Identity resolved from the `Authorization` header.
pub struct HeaderUser {
    pub identity: Identity,
}

impl<S> axum::extract::FromRequestParts<S> for HeaderUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let identity =
            guard::authorize(app_state.store.as_ref(), &app_state.tokens, header_token(&parts.headers)).await?;
        Ok(Self { identity })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Unparseable, mistyped or non-JSON bodies.
fn invalid_body(rejection: JsonRejection) -> AuthError {
    AuthError::InvalidRequest(rejection.body_text())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub jwt: String,
}

/// `POST /register`: create an account for an allow-listed email.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), AuthError> {
    let Json(req) = payload.map_err(invalid_body)?;
    let view = account::register(state.store.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `POST /login`: return the token in the body and as an HttpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthError> {
    let Json(req) = payload.map_err(invalid_body)?;
    let outcome = account::login(state.store.as_ref(), &state.tokens, &req).await?;
    let jar = jar.add(jwt_cookie(outcome.token.clone(), TOKEN_TTL));
    Ok((jar, Json(LoginResponse { jwt: outcome.token })))
}

/// `GET /user`: current user from the `jwt` cookie.
pub async fn current_user(auth: CookieUser) -> Json<UserView> {
    Json(UserView::from(&auth.identity))
}

/// `GET /api/me`: current user from the `Authorization` header.
pub async fn me(auth: HeaderUser) -> Json<UserView> {
    Json(UserView::from(&auth.identity))
}

/// `POST /logout`: clear the cookie. The token itself stays valid until expiry.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.add(jwt_cookie(String::new(), Duration::ZERO)), StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
