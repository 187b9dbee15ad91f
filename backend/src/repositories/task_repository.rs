//! Database repository for task management operations.

use crate::api::common::PaginationFilter;
use crate::database::models::Task;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const TASK_COLUMNS: &str =
    "id, title, description, status, assigned_to, created_by, due_date, created_at, updated_at";

/// Repository for task database operations.
pub struct TaskRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> TaskRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a fully built task row.
    pub async fn create_task(&self, task: &Task) -> Result<Task> {
        let created = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, title, description, status, assigned_to, created_by, due_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(&task.assigned_to)
        .bind(&task.created_by)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_task_by_id(&self, id: &str) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(task)
    }

    /// All tasks, newest first.
    pub async fn get_all_tasks(&self, pagination: &PaginationFilter) -> Result<Vec<Task>> {
        let limit = pagination.limit() as i64;
        let offset = pagination.offset() as i64;

        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn count_all_tasks(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }

    /// Tasks assigned to one user, newest first.
    pub async fn get_tasks_by_assignee(
        &self,
        user_id: &str,
        pagination: &PaginationFilter,
    ) -> Result<Vec<Task>> {
        let limit = pagination.limit() as i64;
        let offset = pagination.offset() as i64;

        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn count_tasks_by_assignee(&self, user_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE assigned_to = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }

    /// Persists the mutable fields of a task row.
    pub async fn update_task(&self, task: &Task) -> Result<Task> {
        let updated = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks \
             SET title = ?, description = ?, status = ?, assigned_to = ?, due_date = ?, updated_at = ? \
             WHERE id = ? \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(&task.assigned_to)
        .bind(task.due_date)
        .bind(Utc::now())
        .bind(&task.id)
        .fetch_one(self.pool)
        .await?;

        Ok(updated)
    }

    /// Deletes a task row. Returns whether a row was removed.
    pub async fn delete_task(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
