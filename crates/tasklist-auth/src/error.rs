//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token carries no usable identity")]
    MissingIdentity,

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Credential store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Stable label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::MissingIdentity => "missing_identity",
            AuthError::Hashing(_) => "hashing_failure",
            AuthError::Signing(_) => "signing_failure",
            AuthError::Store(_) => "store_failure",
        }
    }

    /// Server-side failures, as opposed to anything the client caused
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Hashing(_) | AuthError::Signing(_) | AuthError::Store(_)
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Token sub-cases all look the same from outside
        let (status, message) = match &self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            e if e.is_internal() => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            _ => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
