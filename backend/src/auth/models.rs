//! Data structures for authentication-related entities.
//!
//! This module defines request and response payloads for the authentication
//! flow together with the public user projection attached to requests.

use crate::database::models::{Role, User};
use crate::utils::password::validate_password_strength;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Public projection of a user record. Never carries the password hash.
///
/// This is also the identity context attached to authenticated requests and
/// consumed by downstream task/attendance handlers.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        AuthUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            active: user.is_active,
        }
    }
}

/// Raw bearer token attached to the request context alongside [`AuthUser`].
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response containing the access token and user info. The refresh
/// token travels only in the HTTP-only cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: AuthUser,
    pub expires_in: u64, // Token expiration in seconds
}

/// Registration payload (admin-issued).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1-255 characters"))]
    pub name: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,

    /// Defaults to `user` when omitted.
    pub role: Option<Role>,
}

/// Token refresh response
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}
