//! Defines the HTTP routes for task management.
//!
//! Every route requires authentication; creation, field updates, and
//! deletion additionally require the admin role.

use super::handlers::{
    create_task, delete_task, get_task, list_tasks, update_task, update_task_status,
};
use crate::auth::middleware::{admin_auth, require_auth};
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

pub fn task_router() -> Router {
    Router::new()
        .route("/", get(list_tasks))
        .route("/{id}", get(get_task))
        .route("/{id}/status", patch(update_task_status))
        .merge(
            Router::new()
                .route("/", post(create_task))
                .route("/{id}", patch(update_task).delete(delete_task))
                .layer(middleware::from_fn(admin_auth)),
        )
        .layer(middleware::from_fn(require_auth))
}
