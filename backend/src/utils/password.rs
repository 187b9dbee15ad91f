//! Password hashing, verification, and strength validation.
//!
//! Plaintext passwords enter this module exactly once (to be hashed or
//! verified) and are never logged or persisted.

use crate::errors::{ServiceError, ServiceResult};
use bcrypt::{DEFAULT_COST, hash, verify};
use validator::ValidationError;

/// Symbols accepted by the strength predicate.
const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Minimum plaintext length accepted at registration and password change.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Hashes a plaintext password with a per-hash random salt.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
}

/// Verifies a plaintext password against a stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> ServiceResult<bool> {
    verify(password, password_hash)
        .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {}", e)))
}

/// Strength predicate used by validator derives on registration payloads.
///
/// Requires at least 8 characters with one uppercase, one lowercase, one
/// digit, and one symbol from the fixed set.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if long_enough && has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_strength");
        error.message = Some(
            "Password must be at least 8 characters with an uppercase letter, \
             a lowercase letter, a digit, and a symbol"
                .into(),
        );
        Err(error)
    }
}

/// Service-level wrapper around the strength predicate for partial updates,
/// where the payload is not a derive-validated DTO.
pub fn ensure_password_strength(password: &str) -> ServiceResult<()> {
    validate_password_strength(password).map_err(|e| {
        ServiceError::validation(
            e.message
                .as_deref()
                .unwrap_or("Password does not meet strength requirements")
                .to_string(),
        )
    })
}
