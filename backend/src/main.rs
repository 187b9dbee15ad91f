//! Main entry point for the TaskTracker backend.
//!
//! This file initializes the Axum web server, sets up database connections,
//! and registers all API routes and middleware.
//! It orchestrates the application's startup and defines its overall structure.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

use crate::api::common::ApiResponse;
use crate::auth::rate_limit::LoginRateLimiter;
use crate::auth::service::AuthService;
use crate::utils::jwt::JwtKeys;
use axum::{Extension, Router, response::Json, routing::get};
use config::Config;
use database::Database;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();
    let db = Database::new(&config).await.unwrap();
    let pool = db.pool().clone();

    let jwt_keys = JwtKeys::from_config(&config);
    let login_limiter = Arc::new(LoginRateLimiter::new(
        config.login_max_attempts,
        config.login_window_seconds,
    ));

    AuthService::new(&pool, jwt_keys.clone())
        .bootstrap_default_admin(&config)
        .await
        .unwrap();

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .nest("/api/tasks", api::task::routes::task_router())
        .nest("/api/attendance", api::attendance::routes::attendance_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(pool))
        .layer(Extension(jwt_keys))
        .layer(Extension(config.clone()))
        .layer(Extension(login_limiter));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting TaskTracker server on port {}", config.server_port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "TaskTracker Backend",
            "version": "0.1.0"
        }),
        "Welcome to TaskTracker API",
    ))
}
