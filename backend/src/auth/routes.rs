//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle endpoints like user login, registration, and token refreshing.
//! These are designed to be integrated into the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::{admin_auth, require_auth};
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route(
            "/register",
            post(register)
                .layer(middleware::from_fn(admin_auth))
                .layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/logout",
            post(logout).layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/me",
            get(me)
                .patch(update_me)
                .layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/users/{id}",
            patch(admin_update_user)
                .layer(middleware::from_fn(admin_auth))
                .layer(middleware::from_fn(require_auth)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::RegisterRequest;
    use crate::auth::service::AuthService;
    use crate::database::models::Role;
    use crate::utils::jwt::{JwtKeys, TokenKind};
    use axum::Extension;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    const ACCESS_SECRET: &[u8] = b"test-access-secret-at-least-32-bytes";
    const REFRESH_SECRET: &[u8] = b"test-refresh-secret-at-least-32-byte";

    async fn test_app() -> (Router, SqlitePool, JwtKeys) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let keys = JwtKeys::new(ACCESS_SECRET, REFRESH_SECRET, 3600, 604800);

        let app = Router::new()
            .nest("/auth", auth_router())
            .layer(Extension(pool.clone()))
            .layer(Extension(keys.clone()));

        (app, pool, keys)
    }

    async fn seed_user(
        pool: &SqlitePool,
        keys: &JwtKeys,
        email: &str,
        role: Role,
    ) -> (String, String) {
        let service = AuthService::new(pool, keys.clone());
        let user = service
            .register(RegisterRequest {
                name: "Test User".to_string(),
                email: email.to_string(),
                password: "Abcdef1!".to_string(),
                role: Some(role),
            })
            .await
            .unwrap();
        let token = keys.issue(&user.id, TokenKind::Access).unwrap();
        (user.id, token)
    }

    fn patch_user_request(target_id: &str, token: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri(format!("/auth/users/{}", target_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_role_guard_blocks_non_admin_user_update() {
        let (app, pool, keys) = test_app().await;
        let (admin_id, _) = seed_user(&pool, &keys, "admin@example.com", Role::Admin).await;
        let (_, worker_token) = seed_user(&pool, &keys, "worker@example.com", Role::User).await;

        let response = app
            .oneshot(patch_user_request(
                &admin_id,
                &worker_token,
                r#"{"role":"admin"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_token_passes_role_guard() {
        let (app, pool, keys) = test_app().await;
        let (_, admin_token) = seed_user(&pool, &keys, "admin@example.com", Role::Admin).await;
        let (worker_id, _) = seed_user(&pool, &keys, "worker@example.com", Role::User).await;

        let response = app
            .oneshot(patch_user_request(
                &worker_id,
                &admin_token,
                r#"{"role":"admin"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _, _) = test_app().await;

        let request = Request::builder()
            .method("GET")
            .uri("/auth/me")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stale_kind_token_rejected_at_gate() {
        let (app, pool, keys) = test_app().await;
        let (user_id, _) = seed_user(&pool, &keys, "worker@example.com", Role::User).await;

        // A refresh token presented as a bearer credential must not pass.
        let refresh_token = keys.issue(&user_id, TokenKind::Refresh).unwrap();

        let request = Request::builder()
            .method("GET")
            .uri("/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", refresh_token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
