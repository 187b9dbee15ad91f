//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for user authentication (login, registration,
//! token refresh), parse request data, validate input, and interact with the
//! `auth::service` for core business logic.

use crate::api::common::service_error_to_http;
use crate::auth::models::*;
use crate::auth::rate_limit::LoginRateLimiter;
use crate::auth::service::AuthService;
use crate::config::Config;
use crate::errors::ServiceError;
use crate::utils::jwt::JwtKeys;
use axum::{
    extract::{ConnectInfo, Extension, Json, Path},
    http::StatusCode,
    response::Json as ResponseJson,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;

/// Builds the refresh-token cookie: HTTP-only, strict same-site, secure
/// outside development, lifetime matching the token's.
fn refresh_cookie(value: String, max_age_seconds: i64, config: &Config) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.cookie_secure)
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(config): Extension<Config>,
    Extension(rate_limiter): Extension<Arc<LoginRateLimiter>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ResponseJson<LoginResponse>), (StatusCode, String)> {
    // Throttle before any credential work happens.
    if let Err(error) = rate_limiter.check(&addr.ip().to_string()) {
        return Err(service_error_to_http(error));
    }

    let auth_service = AuthService::new(&pool, jwt_keys.clone());
    let (response, refresh_token) = match auth_service.login(payload).await {
        Ok(result) => result,
        Err(error) => return Err(service_error_to_http(error)),
    };

    let cookie = refresh_cookie(
        refresh_token,
        jwt_keys.refresh_lifetime_seconds() as i64,
        &config,
    );

    Ok((jar.add(cookie), ResponseJson(response)))
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt_keys): Extension<JwtKeys>,
    jar: CookieJar,
) -> Result<ResponseJson<RefreshTokenResponse>, (StatusCode, String)> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| {
            service_error_to_http(ServiceError::unauthenticated("Invalid refresh token"))
        })?;

    let auth_service = AuthService::new(&pool, jwt_keys);
    match auth_service.refresh_token(&token).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user registration request (admin only, enforced by the route).
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt_keys): Extension<JwtKeys>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<AuthUser>), (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt_keys);
    match auth_service.register(payload).await {
        Ok(user) => Ok((StatusCode::CREATED, ResponseJson(user))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request.
///
/// Stateless on the server; clearing the refresh cookie is the whole effect.
/// Requires authentication so only the session holder can trigger it.
#[axum::debug_handler]
pub async fn logout(
    jar: CookieJar,
) -> Result<(CookieJar, ResponseJson<serde_json::Value>), (StatusCode, String)> {
    let removal = Cookie::build((REFRESH_COOKIE, "")).path("/").build();

    Ok((
        jar.remove(removal),
        ResponseJson(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}

/// Get current user information resolved by the auth middleware.
#[axum::debug_handler]
pub async fn me(Extension(user): Extension<AuthUser>) -> ResponseJson<AuthUser> {
    ResponseJson(user)
}

/// Handle self-service profile update.
#[axum::debug_handler]
pub async fn update_me(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<serde_json::Value>,
) -> Result<ResponseJson<AuthUser>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt_keys);
    match auth_service.update_self(&user.id, &payload).await {
        Ok(updated) => Ok(ResponseJson(updated)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle admin update of any user (role/active included).
#[axum::debug_handler]
pub async fn admin_update_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt_keys): Extension<JwtKeys>,
    Path(id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<ResponseJson<AuthUser>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, jwt_keys);
    match auth_service.admin_update_user(&id, &payload).await {
        Ok(updated) => Ok(ResponseJson(updated)),
        Err(error) => Err(service_error_to_http(error)),
    }
}
