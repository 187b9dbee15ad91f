//! User business logic service.
//!
//! Handles user creation, credential checks, and partial updates.

use crate::auth::models::RegisterRequest;
use crate::database::models::{CreateUser, Role, User, UserUpdate};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::is_unique_violation;
use crate::repositories::user_repository::UserRepository;
use crate::utils::password::{ensure_password_strength, hash_password, verify_password};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

/// Fields a user may change on their own record.
pub const SELF_UPDATABLE_FIELDS: &[&str] = &["name", "email", "password"];

/// Fields an admin may change on any record.
pub const ADMIN_UPDATABLE_FIELDS: &[&str] = &["name", "email", "password", "role", "active"];

/// Single generic failure for every way a login can go wrong, so callers
/// cannot probe which of email, password, or active-status was at fault.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user with full validation.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` for field/strength failures and for
    /// a duplicate email. The duplicate-email message is deliberately
    /// distinct from login's generic failure: registration is admin-issued,
    /// so enumeration risk is accepted there.
    pub async fn create_user(&self, request: RegisterRequest) -> ServiceResult<User> {
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

        let email = request.email.to_lowercase();

        let repo = UserRepository::new(self.pool);
        if repo.email_exists(&email).await? {
            return Err(ServiceError::validation("Email already in use"));
        }

        let password_hash = hash_password(&request.password)?;

        let data = CreateUser {
            id: Uuid::now_v7().to_string(),
            name: request.name,
            email,
            password_hash,
            role: request.role.unwrap_or(Role::User),
        };

        // The unique index is the real guard: a concurrent registration that
        // slipped past the pre-check surfaces here as the same failure.
        match repo.create_user(data).await {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                Err(ServiceError::validation("Email already in use"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks credentials for login.
    ///
    /// Unknown email, deactivated user, and wrong password all produce the
    /// identical `Unauthenticated` failure.
    pub async fn authenticate_user(&self, email: &str, password: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);

        let user = repo
            .get_user_by_email(&email.to_lowercase())
            .await?
            .ok_or_else(|| ServiceError::unauthenticated(INVALID_CREDENTIALS))?;

        if !user.is_active {
            return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(ServiceError::unauthenticated(INVALID_CREDENTIALS));
        }

        Ok(user)
    }

    /// Retrieves a user by ID with existence verification.
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        Ok(user)
    }

    /// Parses a partial-update payload against an allow-list.
    ///
    /// All-or-nothing: a single key outside the allow-list rejects the whole
    /// request rather than being silently ignored.
    pub fn parse_update(
        payload: &serde_json::Value,
        allowed_fields: &[&str],
    ) -> ServiceResult<UserUpdate> {
        let object = payload
            .as_object()
            .ok_or_else(|| ServiceError::validation("Invalid updates"))?;

        if object
            .keys()
            .any(|key| !allowed_fields.contains(&key.as_str()))
        {
            return Err(ServiceError::validation("Invalid updates"));
        }

        serde_json::from_value(payload.clone())
            .map_err(|_| ServiceError::validation("Invalid updates"))
    }

    /// Applies a validated partial update to a user record.
    ///
    /// A password change re-runs the strength predicate and stamps
    /// `password_changed_at`, which invalidates every previously issued
    /// token.
    pub async fn apply_update(&self, user_id: &str, update: UserUpdate) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let mut user = self.get_user_required(user_id).await?;

        if let Some(name) = update.name {
            if name.is_empty() || name.len() > 255 {
                return Err(ServiceError::validation(
                    "Name must be between 1-255 characters",
                ));
            }
            user.name = name;
        }

        if let Some(email) = update.email {
            if !email.validate_email() {
                return Err(ServiceError::validation("Must be a valid email"));
            }
            let email = email.to_lowercase();
            if repo.email_exists_excluding(&email, user_id).await? {
                return Err(ServiceError::validation("Email already in use"));
            }
            user.email = email;
        }

        if let Some(password) = update.password {
            ensure_password_strength(&password)?;
            user.password_hash = hash_password(&password)?;
            user.password_changed_at = Some(Utc::now());
        }

        if let Some(role) = update.role {
            user.role = role;
        }

        if let Some(active) = update.active {
            user.is_active = active;
        }

        match repo.update_user(&user).await {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                Err(ServiceError::validation("Email already in use"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_accepts_allowed_fields() {
        let payload = serde_json::json!({ "name": "New Name", "email": "new@example.com" });
        let update = UserService::parse_update(&payload, SELF_UPDATABLE_FIELDS).unwrap();

        assert_eq!(update.name.as_deref(), Some("New Name"));
        assert_eq!(update.email.as_deref(), Some("new@example.com"));
        assert!(update.password.is_none());
    }

    #[test]
    fn test_parse_update_rejects_unknown_field_wholesale() {
        // One bad key poisons the entire request, valid keys included.
        let payload = serde_json::json!({ "name": "New Name", "is_admin": true });
        let err = UserService::parse_update(&payload, SELF_UPDATABLE_FIELDS).unwrap_err();

        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[test]
    fn test_parse_update_rejects_role_change_for_self_scope() {
        let payload = serde_json::json!({ "role": "admin" });

        assert!(UserService::parse_update(&payload, SELF_UPDATABLE_FIELDS).is_err());
        assert!(UserService::parse_update(&payload, ADMIN_UPDATABLE_FIELDS).is_ok());
    }

    #[test]
    fn test_parse_update_rejects_non_object_payload() {
        let payload = serde_json::json!(["name"]);

        assert!(UserService::parse_update(&payload, SELF_UPDATABLE_FIELDS).is_err());
    }
}
