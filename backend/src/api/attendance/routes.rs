//! Defines the HTTP routes for attendance.
//!
//! Every route requires authentication; reading another user's history
//! additionally requires the admin role.

use super::handlers::{list_my_attendance, list_user_attendance, mark_attendance};
use crate::auth::middleware::{admin_auth, require_auth};
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn attendance_router() -> Router {
    Router::new()
        .route("/", post(mark_attendance).get(list_my_attendance))
        .merge(
            Router::new()
                .route("/users/{id}", get(list_user_attendance))
                .layer(middleware::from_fn(admin_auth)),
        )
        .layer(middleware::from_fn(require_auth))
}
