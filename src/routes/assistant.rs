//! Assistant route: forward a user query to the completion service.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::services::assistant::{self, AssistantError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryError {
    pub error: String,
}

fn query_error(status: StatusCode, message: &str) -> Response {
    (status, Json(QueryError { error: message.to_owned() })).into_response()
}

/// `POST /api/assistant/query`: open endpoint, no auth.
pub async fn query(State(state): State<AppState>, payload: Result<Json<QueryRequest>, JsonRejection>) -> Response {
    let Ok(Json(req)) = payload else {
        return query_error(StatusCode::BAD_REQUEST, "Invalid JSON");
    };
    let Some(query) = assistant::normalize_query(&req.query) else {
        return query_error(StatusCode::BAD_REQUEST, "No query provided");
    };
    let Some(llm) = &state.llm else {
        return query_error(StatusCode::SERVICE_UNAVAILABLE, "Assistant not configured");
    };

    match assistant::answer(llm.as_ref(), query).await {
        Ok(text) => Json(QueryResponse { response: text }).into_response(),
        Err(AssistantError::EmptyQuery) => query_error(StatusCode::BAD_REQUEST, "No query provided"),
        Err(AssistantError::Llm(e)) => {
            tracing::error!(error = %e, code = e.error_code(), "assistant completion failed");
            query_error(e.status(), &e.public_message())
        }
    }
}
