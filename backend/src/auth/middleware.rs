//! Middleware for protecting authenticated routes and handling authorization.
//!
//! This module contains the per-request authentication gate and the role
//! guard. The gate resolves the token's subject against the store on every
//! request; the guard only inspects the identity the gate attached.

use crate::api::common::service_error_to_http;
use crate::auth::models::{AuthUser, BearerToken};
use crate::auth::service::AuthService;
use crate::database::models::Role;
use crate::errors::ServiceError;
use crate::utils::jwt::JwtKeys;
use axum::{
    extract::{Extension, Request},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;

/// Authentication gate for protected routes.
///
/// Extracts the bearer token, verifies it as an access token, resolves the
/// subject to an existing active user, and rejects tokens issued before the
/// latest password change. On success the resolved identity and the raw
/// token are attached to the request extensions.
pub async fn require_auth(
    Extension(pool): Extension<SqlitePool>,
    Extension(jwt_keys): Extension<JwtKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let token = {
        let auth_header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| {
                service_error_to_http(ServiceError::unauthenticated(
                    "malformed authorization header",
                ))
            })?;

        auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                service_error_to_http(ServiceError::unauthenticated(
                    "malformed authorization header",
                ))
            })?
            .to_string()
    };

    let auth_service = AuthService::new(&pool, jwt_keys);
    let user = auth_service
        .resolve_access_token(&token)
        .await
        .map_err(service_error_to_http)?;

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

/// Whether a role is in the allowed set.
pub fn role_allowed(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// Role guard. Composes strictly after [`require_auth`]: it never resolves
/// identity itself, only inspects what the gate attached.
pub async fn require_roles(
    allowed: &[Role],
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let role = request.extensions().get::<AuthUser>().map(|user| user.role);

    let Some(role) = role else {
        return Err(service_error_to_http(ServiceError::unauthenticated(
            "authentication required",
        )));
    };

    if !role_allowed(role, allowed) {
        return Err(service_error_to_http(ServiceError::permission_denied(
            "insufficient role",
        )));
    }

    Ok(next.run(request).await)
}

/// Admin role authorization middleware
pub async fn admin_auth(request: Request, next: Next) -> Result<Response, (StatusCode, String)> {
    require_roles(&[Role::Admin], request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_allowed() {
        assert!(role_allowed(Role::Admin, &[Role::Admin]));
        assert!(role_allowed(Role::User, &[Role::Admin, Role::User]));
        assert!(!role_allowed(Role::User, &[Role::Admin]));
        assert!(!role_allowed(Role::Admin, &[]));
    }
}
