//! Task operations
//!
//! Every lookup and mutation is scoped by the owning user, so a task
//! belonging to someone else is indistinguishable from a missing one.

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewTask, Task, TaskChanges};

use super::Database;

impl Database {
    /// Insert a new task
    pub async fn insert_task(&self, task: NewTask) -> Result<Task, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, completed, user_id, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.user_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // Owner deleted while still holding a token
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                DbError::NotFound("User not found".to_string())
            }
            other => DbError::Connection(other),
        })?;

        Ok(Task {
            id: result.get("id"),
            title: task.title,
            description: task.description,
            completed: false,
            user_id: task.user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// List all tasks owned by a user, oldest first
    pub async fn list_tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, completed, user_id, created_at, updated_at
            FROM tasks
            WHERE user_id = ?
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Task::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a task if it exists and is owned by the user
    pub async fn get_task_for_user(&self, id: i64, user_id: i64) -> Result<Option<Task>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, title, description, completed, user_id, created_at, updated_at
            FROM tasks
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Task::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Update a task owned by the user, returning the new state
    pub async fn update_task_for_user(
        &self,
        id: i64,
        user_id: i64,
        changes: TaskChanges,
    ) -> Result<Option<Task>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, completed = COALESCE(?, completed), updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.completed)
        .bind(now.to_rfc3339())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_task_for_user(id, user_id).await
    }

    /// Delete a task owned by the user
    pub async fn delete_task_for_user(&self, id: i64, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
