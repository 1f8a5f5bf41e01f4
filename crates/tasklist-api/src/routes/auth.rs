//! Registration and login routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use tasklist_auth::AuthError;
use tasklist_db::{DbError, NewUser};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 6;
/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;

/// Validate username format and length
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate email shape
fn validate_email(email: &str) -> Result<(), ApiError> {
    let plausible = email.len() > 3
        && email.len() < MAX_EMAIL_LENGTH
        && email.contains('@')
        && email.contains('.');
    if !plausible {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn user_exists() -> ApiError {
    ApiError::Conflict("User already exists".to_string())
}

// ==================== Auth Routes ====================

/// POST /api/register
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload?;

    validate_username(&request.username)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    debug!("Registering user: {}", request.username);

    // Cheap check first so duplicates don't pay for a hash
    if state
        .db
        .get_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(user_exists());
    }

    let password_hash = state.auth.hash_password(&request.password).await?;

    let user = state
        .db
        .insert_user(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            DbError::Duplicate(_) => user_exists(),
            other => other.into(),
        })?;

    info!("Registered user: {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user: user.into(),
        }),
    ))
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    // Oversized input is refused before hashing; anything else gets the
    // same answer as a wrong password
    if request.username.len() > MAX_USERNAME_LENGTH
        || request.password.len() > MAX_PASSWORD_LENGTH
    {
        return Err(AuthError::InvalidCredentials.into());
    }

    let session = state.auth.login(&request.username, &request.password).await?;

    let user = state
        .db
        .get_user_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: session.token,
        expires_in: session.expires_in,
        user: user.into(),
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice_b-2").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username("ålice").is_err());
        assert!(validate_username("алиса").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("123").is_err());
        assert!(validate_password(&"x".repeat(257)).is_err());
    }
}
