//! Data access layer: one repository per persisted entity.

pub mod attendance_repository;
pub mod task_repository;
pub mod user_repository;

/// Returns true when an error chain bottoms out in a store uniqueness
/// violation. Unique indexes are the authoritative guard against two
/// concurrent writes claiming the same key.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
    )
}
