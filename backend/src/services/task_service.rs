//! Task business logic service.
//!
//! Handles task creation, role-aware access, and forward-only status
//! transitions.

use crate::api::common::PaginationFilter;
use crate::auth::models::AuthUser;
use crate::database::models::{CreateTask, Role, Task, TaskStatus, TaskUpdate};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::task_repository::TaskRepository;
use crate::repositories::user_repository::UserRepository;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

pub struct TaskService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> TaskService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a task assigned to an existing active user.
    pub async fn create_task(&self, created_by: &str, request: CreateTask) -> ServiceResult<Task> {
        if let Err(validation_errors) = request.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            return Err(ServiceError::validation(error_messages.join(", ")));
        }

        self.require_active_user(&request.assigned_to).await?;

        let now = Utc::now();
        let task = Task {
            id: Uuid::now_v7().to_string(),
            title: request.title,
            description: request.description,
            status: TaskStatus::Pending,
            assigned_to: request.assigned_to,
            created_by: created_by.to_string(),
            due_date: request.due_date,
            created_at: now,
            updated_at: now,
        };

        let repo = TaskRepository::new(self.pool);
        Ok(repo.create_task(&task).await?)
    }

    /// Loads a task, restricted to its assignee or an admin.
    pub async fn get_task_for(&self, requester: &AuthUser, id: &str) -> ServiceResult<Task> {
        let task = self.get_task_required(id).await?;

        if requester.role != Role::Admin && task.assigned_to != requester.id {
            return Err(ServiceError::permission_denied(
                "Task belongs to another user",
            ));
        }

        Ok(task)
    }

    /// Lists tasks: all of them for admins, own tasks otherwise.
    pub async fn list_tasks(
        &self,
        requester: &AuthUser,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Task>, u64)> {
        let repo = TaskRepository::new(self.pool);

        if requester.role == Role::Admin {
            let tasks = repo.get_all_tasks(pagination).await?;
            let total = repo.count_all_tasks().await?;
            Ok((tasks, total))
        } else {
            let tasks = repo.get_tasks_by_assignee(&requester.id, pagination).await?;
            let total = repo.count_tasks_by_assignee(&requester.id).await?;
            Ok((tasks, total))
        }
    }

    /// Applies a status change.
    ///
    /// The assignee may only advance their own task one step forward; an
    /// admin may set any status.
    pub async fn update_status(
        &self,
        requester: &AuthUser,
        id: &str,
        status: TaskStatus,
    ) -> ServiceResult<Task> {
        let mut task = self.get_task_required(id).await?;

        if requester.role != Role::Admin {
            if task.assigned_to != requester.id {
                return Err(ServiceError::permission_denied(
                    "Task belongs to another user",
                ));
            }
            if !task.status.can_transition_to(status) {
                return Err(ServiceError::validation("Invalid status transition"));
            }
        }

        task.status = status;
        let repo = TaskRepository::new(self.pool);
        Ok(repo.update_task(&task).await?)
    }

    /// Admin update of task fields (title, description, assignee, due date).
    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> ServiceResult<Task> {
        let mut task = self.get_task_required(id).await?;

        if let Some(title) = update.title {
            if title.is_empty() || title.len() > 255 {
                return Err(ServiceError::validation(
                    "Title must be between 1-255 characters",
                ));
            }
            task.title = title;
        }

        if let Some(description) = update.description {
            task.description = Some(description);
        }

        if let Some(assigned_to) = update.assigned_to {
            self.require_active_user(&assigned_to).await?;
            task.assigned_to = assigned_to;
        }

        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }

        let repo = TaskRepository::new(self.pool);
        Ok(repo.update_task(&task).await?)
    }

    /// Deletes a task.
    pub async fn delete_task(&self, id: &str) -> ServiceResult<()> {
        let repo = TaskRepository::new(self.pool);
        if !repo.delete_task(id).await? {
            return Err(ServiceError::not_found("Task", id));
        }
        Ok(())
    }

    async fn get_task_required(&self, id: &str) -> ServiceResult<Task> {
        let repo = TaskRepository::new(self.pool);
        repo.get_task_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task", id))
    }

    async fn require_active_user(&self, user_id: &str) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        repo.get_user_by_id(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;
        Ok(())
    }
}
