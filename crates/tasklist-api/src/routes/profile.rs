//! Profile of the authenticated user

use axum::{Json, Router, extract::State, routing::get};
use tasklist_auth::AuthUser;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::ProfileResponse;

/// GET /api/profile
async fn get_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    // The token can outlive the account
    let user = state
        .db
        .get_user_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        created_at: user.created_at.to_rfc3339(),
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/profile", get(get_profile))
}
