//! Core business logic for the authentication system.

use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::{CreateUser, Role};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::is_unique_violation;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::{
    ADMIN_UPDATABLE_FIELDS, SELF_UPDATABLE_FIELDS, UserService,
};
use crate::utils::jwt::{JwtKeys, TokenKind};
use crate::utils::password::hash_password;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

/// Single generic failure for every way a refresh can go wrong.
const INVALID_REFRESH: &str = "Invalid refresh token";

/// Authentication service for handling registration, login, token issuance,
/// and profile updates.
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    jwt_keys: JwtKeys,
    user_service: UserService<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(pool: &'a SqlitePool, jwt_keys: JwtKeys) -> Self {
        let user_service = UserService::new(pool);

        AuthService {
            pool,
            jwt_keys,
            user_service,
        }
    }

    /// Registers a new user (admin-issued) and returns the public projection.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthUser> {
        let user = self.user_service.create_user(request).await?;
        Ok(user.into())
    }

    /// Authenticate user and generate access/refresh tokens.
    ///
    /// Returns the login response body together with the refresh token, which
    /// the handler delivers as an HTTP-only cookie.
    pub async fn login(&self, login_request: LoginRequest) -> ServiceResult<(LoginResponse, String)> {
        // Validate input
        if let Err(validation_errors) = login_request.validate() {
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

        let user = self
            .user_service
            .authenticate_user(&login_request.email, &login_request.password)
            .await?;

        let access_token = self.jwt_keys.issue(&user.id, TokenKind::Access)?;
        let refresh_token = self.jwt_keys.issue(&user.id, TokenKind::Refresh)?;

        let response = LoginResponse {
            access_token,
            user: user.into(),
            expires_in: self.jwt_keys.access_lifetime_seconds(),
        };

        Ok((response, refresh_token))
    }

    /// Mints a new access token from a refresh token.
    ///
    /// The refresh token is not rotated. Every failure collapses into one
    /// generic message.
    pub async fn refresh_token(&self, refresh_token: &str) -> ServiceResult<RefreshTokenResponse> {
        let claims = self
            .jwt_keys
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| ServiceError::unauthenticated(INVALID_REFRESH))?;

        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(claims.user_id())
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ServiceError::unauthenticated(INVALID_REFRESH))?;

        let access_token = self.jwt_keys.issue(&user.id, TokenKind::Access)?;

        Ok(RefreshTokenResponse {
            access_token,
            expires_in: self.jwt_keys.access_lifetime_seconds(),
        })
    }

    /// Verifies an access token and resolves its subject to a live identity.
    ///
    /// The user record is read fresh from the store on every call; a token
    /// issued before the latest password change is rejected even when
    /// unexpired.
    pub async fn resolve_access_token(&self, token: &str) -> ServiceResult<AuthUser> {
        let claims = self.jwt_keys.verify(token, TokenKind::Access)?;

        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(claims.user_id())
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ServiceError::unauthenticated("unknown or deactivated user"))?;

        if let Some(changed_at) = user.password_changed_at {
            if changed_at.timestamp() > claims.issued_at() {
                return Err(ServiceError::unauthenticated(
                    "credentials changed, reauthenticate",
                ));
            }
        }

        Ok(user.into())
    }

    /// Applies a self-service profile update restricted to
    /// {name, email, password}.
    pub async fn update_self(
        &self,
        user_id: &str,
        payload: &serde_json::Value,
    ) -> ServiceResult<AuthUser> {
        let update = UserService::parse_update(payload, SELF_UPDATABLE_FIELDS)?;
        let user = self.user_service.apply_update(user_id, update).await?;
        Ok(user.into())
    }

    /// Applies an admin update to any user, additionally allowing
    /// {role, active}.
    pub async fn admin_update_user(
        &self,
        target_id: &str,
        payload: &serde_json::Value,
    ) -> ServiceResult<AuthUser> {
        let update = UserService::parse_update(payload, ADMIN_UPDATABLE_FIELDS)?;
        let user = self.user_service.apply_update(target_id, update).await?;
        Ok(user.into())
    }

    /// Creates the default admin if it does not exist yet.
    ///
    /// Safe to run from several process starts at once: the email unique
    /// index is the real guard, the lookup only avoids pointless work.
    pub async fn bootstrap_default_admin(&self, config: &Config) -> ServiceResult<()> {
        let Some(password) = config.default_admin_password.as_deref() else {
            tracing::warn!("DEFAULT_ADMIN_PASSWORD not set; skipping default admin bootstrap");
            return Ok(());
        };

        let email = config.default_admin_email.to_lowercase();

        let repo = UserRepository::new(self.pool);
        if repo.get_user_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let data = CreateUser {
            id: Uuid::now_v7().to_string(),
            name: config.default_admin_name.clone(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            role: Role::Admin,
        };

        match repo.create_user(data).await {
            Ok(user) => {
                tracing::info!("Created default admin user {}", user.email);
                Ok(())
            }
            // Another process start won the race; the admin exists.
            Err(e) if is_unique_violation(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::Claims;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    const ACCESS_SECRET: &[u8] = b"test-access-secret-at-least-32-bytes";
    const REFRESH_SECRET: &[u8] = b"test-refresh-secret-at-least-32-byte";

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn test_keys() -> JwtKeys {
        JwtKeys::new(ACCESS_SECRET, REFRESH_SECRET, 3600, 604800)
    }

    fn register_request(name: &str, email: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "Abcdef1!".to_string(),
            role,
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// An access token signed with the right secret but issued in the past,
    /// so stale-credential checks have a deterministic instant to compare.
    fn backdated_access_token(subject: &str, issued_seconds_ago: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            kind: TokenKind::Access,
            exp: (now + 3600) as usize,
            iat: (now - issued_seconds_ago) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(ACCESS_SECRET),
        )
        .unwrap()
    }

    async fn user_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_defaults_to_user_role_and_lowercases_email() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "Ada@Example.COM", None))
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::User);
        assert!(user.active);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let mut request = register_request("Ada", "ada@example.com", None);
        request.password = "weakpass".to_string();

        let err = service.register(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        assert_eq!(user_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_fails_and_keeps_one_record() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();

        // Documented behavior: the duplicate-email failure is distinct from
        // login's generic message (registration is admin-only).
        let err = service
            .register(register_request("Imposter", "ADA@example.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation { .. }));
        assert!(err.to_string().contains("Email already in use"));
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_login_issues_both_token_kinds() {
        let pool = test_pool().await;
        let keys = test_keys();
        let service = AuthService::new(&pool, keys.clone());

        let user = service
            .register(register_request("Ada", "ada@example.com", Some(Role::Admin)))
            .await
            .unwrap();

        let (response, refresh_token) = service
            .login(login_request("ada@example.com", "Abcdef1!"))
            .await
            .unwrap();

        let access_claims = keys
            .verify(&response.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(access_claims.sub, user.id);

        let refresh_claims = keys.verify(&refresh_token, TokenKind::Refresh).unwrap();
        assert_eq!(refresh_claims.sub, user.id);

        // The access token is not interchangeable with the refresh token.
        assert!(keys.verify(&response.access_token, TokenKind::Refresh).is_err());
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();

        let wrong_password = service
            .login(login_request("ada@example.com", "Wrong-pass1!"))
            .await
            .unwrap_err();
        let unknown_email = service
            .login(login_request("ghost@example.com", "Abcdef1!"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());

        // A deactivated user fails with the same message as well.
        service
            .admin_update_user(&user.id, &json!({ "active": false }))
            .await
            .unwrap();

        let deactivated = service
            .login(login_request("ada@example.com", "Abcdef1!"))
            .await
            .unwrap_err();
        assert_eq!(deactivated.to_string(), wrong_password.to_string());
    }

    #[tokio::test]
    async fn test_resolve_access_token_returns_identity() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();
        let (response, _) = service
            .login(login_request("ada@example.com", "Abcdef1!"))
            .await
            .unwrap();

        let resolved = service
            .resolve_access_token(&response.access_token)
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_password_change_invalidates_prior_tokens() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();

        let old_token = backdated_access_token(&user.id, 10);
        service.resolve_access_token(&old_token).await.unwrap();

        service
            .update_self(&user.id, &json!({ "password": "NewSecret9$" }))
            .await
            .unwrap();

        let err = service.resolve_access_token(&old_token).await.unwrap_err();
        assert!(err.to_string().contains("credentials changed"));

        // Logging in again with the new password yields a working token.
        let (response, _) = service
            .login(login_request("ada@example.com", "NewSecret9$"))
            .await
            .unwrap();
        service
            .resolve_access_token(&response.access_token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_deactivation_kills_existing_tokens() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();
        let (response, _) = service
            .login(login_request("ada@example.com", "Abcdef1!"))
            .await
            .unwrap();

        service
            .admin_update_user(&user.id, &json!({ "active": false }))
            .await
            .unwrap();

        let err = service
            .resolve_access_token(&response.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_refresh_mints_new_access_token() {
        let pool = test_pool().await;
        let keys = test_keys();
        let service = AuthService::new(&pool, keys.clone());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();
        let (_, refresh_token) = service
            .login(login_request("ada@example.com", "Abcdef1!"))
            .await
            .unwrap();

        let refreshed = service.refresh_token(&refresh_token).await.unwrap();
        let claims = keys
            .verify(&refreshed.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn test_refresh_failures_are_generic() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();
        let (response, refresh_token) = service
            .login(login_request("ada@example.com", "Abcdef1!"))
            .await
            .unwrap();

        // An access token presented at the refresh endpoint fails the same
        // way garbage does.
        let with_access = service
            .refresh_token(&response.access_token)
            .await
            .unwrap_err();
        let with_garbage = service.refresh_token("not-a-token").await.unwrap_err();
        assert_eq!(with_access.to_string(), with_garbage.to_string());

        // Deactivation closes the refresh path too.
        service
            .admin_update_user(&user.id, &json!({ "active": false }))
            .await
            .unwrap();
        let after_deactivation = service.refresh_token(&refresh_token).await.unwrap_err();
        assert_eq!(after_deactivation.to_string(), with_garbage.to_string());
    }

    #[tokio::test]
    async fn test_self_update_rejects_privileged_fields() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();

        // The whole request fails, including the otherwise valid name change.
        let err = service
            .update_self(&user.id, &json!({ "name": "Ada L.", "role": "admin" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid updates"));

        let unchanged = UserService::new(&pool)
            .get_user_required(&user.id)
            .await
            .unwrap();
        assert_eq!(unchanged.name, "Ada");
        assert_eq!(unchanged.role, Role::User);
    }

    #[tokio::test]
    async fn test_admin_update_changes_role_and_active() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let user = service
            .register(register_request("Ada", "ada@example.com", None))
            .await
            .unwrap();

        let updated = service
            .admin_update_user(&user.id, &json!({ "role": "admin", "active": false }))
            .await
            .unwrap();

        assert_eq!(updated.role, Role::Admin);
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn test_admin_update_unknown_id_is_not_found() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        let err = service
            .admin_update_user("missing-id", &json!({ "name": "Nobody" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    fn bootstrap_config(password: Option<&str>) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            access_token_secret: "unused-access".to_string(),
            refresh_token_secret: "unused-refresh".to_string(),
            access_token_expires_in_seconds: 3600,
            refresh_token_expires_in_seconds: 604800,
            login_max_attempts: 5,
            login_window_seconds: 900,
            cookie_secure: false,
            server_port: 3000,
            default_admin_name: "Administrator".to_string(),
            default_admin_email: "admin@tasktracker.local".to_string(),
            default_admin_password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_default_admin_is_idempotent() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());
        let config = bootstrap_config(Some("Bootstrap1!"));

        service.bootstrap_default_admin(&config).await.unwrap();
        service.bootstrap_default_admin(&config).await.unwrap();

        let admins = UserRepository::new(&pool)
            .count_by_role(Role::Admin)
            .await
            .unwrap();
        assert_eq!(admins, 1);

        // The bootstrapped admin can log in.
        service
            .login(login_request("admin@tasktracker.local", "Bootstrap1!"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_without_password() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, test_keys());

        service
            .bootstrap_default_admin(&bootstrap_config(None))
            .await
            .unwrap();

        assert_eq!(user_count(&pool).await, 0);
    }
}
