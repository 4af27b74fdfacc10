//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Session endpoints live at the root (`/register`, `/login`, `/user`,
//! `/logout`) where the web client expects them; header-authenticated and
//! assistant endpoints live under `/api`.

pub mod assistant;
pub mod auth;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use tower_http::cors::{AllowCredentials, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Origins from `CORS_ALLOWED_ORIGINS` (comma-separated). Invalid entries are skipped.
fn allowed_origins() -> Vec<HeaderValue> {
    std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect()
}

/// Credentials are only granted to an explicit origin list. Without one,
/// any origin may call the API but never reads a cookie-authenticated
/// response.
fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    if origins.is_empty() {
        return cors.allow_origin(AllowOrigin::any());
    }

    let trusted = origins.clone();
    cors.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(AllowCredentials::predicate(move |origin, _| trusted.contains(origin)))
}

/// Build the full application router, reading CORS origins from the environment.
pub fn app(state: AppState) -> Router {
    app_with_origins(state, allowed_origins())
}

fn app_with_origins(state: AppState, origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/user", get(auth::current_user))
        .route("/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route("/api/assistant/query", post(assistant::query))
        .route("/healthz", get(healthz))
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
