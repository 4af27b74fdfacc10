//! Error codes shared by HTTP handlers.
//!
//! DESIGN
//! ======
//! Service errors implement `ErrorCode` so route handlers render a stable
//! `{code, message}` body without matching on every variant. Internal
//! faults override `public_message` so details stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

pub trait ErrorCode: std::fmt::Display {
    /// Machine-readable code, e.g. `"E_TOKEN_EXPIRED"`.
    fn error_code(&self) -> &'static str;

    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Message sent to the client. Defaults to the `Display` text.
    fn public_message(&self) -> String {
        self.to_string()
    }
}

/// JSON body for every coded error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { code: err.error_code().to_owned(), message: err.public_message() }
    }
}

/// Render an `ErrorCode` as `(status, Json<ErrorBody>)`.
pub fn error_response(err: &(impl ErrorCode + ?Sized)) -> Response {
    (err.status(), Json(ErrorBody::from_error(err))).into_response()
}
