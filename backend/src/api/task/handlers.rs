//! Handler functions for task management API endpoints.
//!
//! These functions process requests for task data, interact with the task
//! service, and return task information scoped to the authenticated user.

use crate::api::common::{ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http};
use crate::auth::models::AuthUser;
use crate::database::models::{CreateTask, Task, TaskUpdate, UpdateTaskStatus};
use crate::services::task_service::TaskService;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use sqlx::SqlitePool;

/// Creates a task (admin only, enforced by the route).
#[axum::debug_handler]
pub async fn create_task(
    Extension(user): Extension<AuthUser>,
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), (StatusCode, String)> {
    let task_service = TaskService::new(&pool);
    let task = task_service
        .create_task(&user.id, payload)
        .await
        .map_err(service_error_to_http)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(task, "Task created successfully")),
    ))
}

/// Lists tasks: every task for admins, own tasks for regular users.
#[axum::debug_handler]
pub async fn list_tasks(
    Extension(user): Extension<AuthUser>,
    Extension(pool): Extension<SqlitePool>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<Json<ApiResponse<Vec<Task>>>, (StatusCode, String)> {
    let task_service = TaskService::new(&pool);
    let (tasks, total) = task_service
        .list_tasks(&user, &pagination)
        .await
        .map_err(service_error_to_http)?;

    let meta = PaginationMeta::from_filter(&pagination, total);
    Ok(Json(ApiResponse::paginated(
        tasks,
        meta,
        "Tasks retrieved successfully",
    )))
}

/// Retrieves a single task visible to the requester.
#[axum::debug_handler]
pub async fn get_task(
    Extension(user): Extension<AuthUser>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Task>>, (StatusCode, String)> {
    let task_service = TaskService::new(&pool);
    let task = task_service
        .get_task_for(&user, &id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        task,
        "Task retrieved successfully",
    )))
}

/// Applies a status transition to a task.
#[axum::debug_handler]
pub async fn update_task_status(
    Extension(user): Extension<AuthUser>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTaskStatus>,
) -> Result<Json<ApiResponse<Task>>, (StatusCode, String)> {
    let task_service = TaskService::new(&pool);
    let task = task_service
        .update_status(&user, &id, payload.status)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        task,
        "Task status updated successfully",
    )))
}

/// Updates task fields (admin only, enforced by the route).
#[axum::debug_handler]
pub async fn update_task(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<ApiResponse<Task>>, (StatusCode, String)> {
    let task_service = TaskService::new(&pool);
    let task = task_service
        .update_task(&id, payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        task,
        "Task updated successfully",
    )))
}

/// Deletes a task (admin only, enforced by the route).
#[axum::debug_handler]
pub async fn delete_task(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, (StatusCode, String)> {
    let task_service = TaskService::new(&pool);
    task_service
        .delete_task(&id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success((), "Task deleted successfully")))
}
