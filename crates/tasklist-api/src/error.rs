//! API error types
//!
//! Every failure leaving a handler passes through [`ApiError`]'s
//! `IntoResponse`, which is the only place status codes are chosen.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] tasklist_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] tasklist_auth::AuthError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Database(e) => match e {
                tasklist_db::DbError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
                tasklist_db::DbError::Duplicate(msg) => (StatusCode::CONFLICT, msg),
                e => {
                    error!("Database error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            ApiError::Auth(e) => {
                if e.is_internal() {
                    error!("Authentication failure: {}", e);
                }
                // Token failures are already collapsed to a single outcome
                return e.into_response();
            }
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
