//! Task routes
//!
//! All handlers run behind the identity middleware and only ever touch the
//! caller's own tasks.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use tasklist_auth::AuthUser;
use tasklist_db::{NewTask, TaskChanges};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CreateTaskRequest, MessageResponse, TaskResponse, UpdateTaskRequest};

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

fn parse_task_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest("Invalid task ID".to_string()))
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    Ok(())
}

/// GET /api/tasks
async fn list_tasks(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state.db.list_tasks_for_user(user.id).await?;

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// POST /api/tasks
async fn create_task(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let Json(request) = payload?;
    validate_title(&request.title)?;

    let task = state
        .db
        .insert_task(NewTask {
            title: request.title,
            description: request.description,
            user_id: user.id,
        })
        .await?;

    info!("User {} created task {}", user.id, task.id);

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// GET /api/tasks/{id}
async fn get_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_task_id(&id)?;

    let task = state
        .db
        .get_task_for_user(id, user.id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task.into()))
}

/// PUT /api/tasks/{id}
async fn update_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let Json(request) = payload?;
    let id = parse_task_id(&id)?;
    validate_title(&request.title)?;

    debug!("User {} updating task {}", user.id, id);

    let task = state
        .db
        .update_task_for_user(
            id,
            user.id,
            TaskChanges {
                title: request.title,
                description: request.description,
                completed: request.completed,
            },
        )
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task.into()))
}

/// DELETE /api/tasks/{id}
async fn delete_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_task_id(&id)?;

    if !state.db.delete_task_for_user(id, user.id).await? {
        return Err(task_not_found());
    }

    info!("User {} deleted task {}", user.id, id);

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Create task routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}
