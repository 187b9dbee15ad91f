//! Attendance business logic service.
//!
//! Enforces the one-record-per-user-per-day rule over the attendance store.

use crate::api::common::PaginationFilter;
use crate::database::models::{AttendanceRecord, AttendanceStatus};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::attendance_repository::AttendanceRepository;
use crate::repositories::is_unique_violation;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct AttendanceService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> AttendanceService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Marks attendance for the current UTC day.
    ///
    /// A second mark on the same day is a validation failure; the unique
    /// index backs the check against concurrent marks.
    pub async fn mark_attendance(
        &self,
        user_id: &str,
        status: Option<AttendanceStatus>,
    ) -> ServiceResult<AttendanceRecord> {
        let now = Utc::now();
        let day = now.date_naive();

        let repo = AttendanceRepository::new(self.pool);
        if repo.get_record_for_day(user_id, day).await?.is_some() {
            return Err(ServiceError::validation(
                "Attendance already marked for today",
            ));
        }

        let record = AttendanceRecord {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            day,
            status: status.unwrap_or(AttendanceStatus::Present),
            marked_at: now,
        };

        match repo.create_record(&record).await {
            Ok(record) => Ok(record),
            Err(e) if is_unique_violation(&e) => Err(ServiceError::validation(
                "Attendance already marked for today",
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// A user's attendance history, most recent first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<AttendanceRecord>, u64)> {
        let repo = AttendanceRepository::new(self.pool);
        let records = repo.get_records_by_user(user_id, pagination).await?;
        let total = repo.count_records_by_user(user_id).await?;
        Ok((records, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CreateUser, Role};
    use crate::repositories::user_repository::UserRepository;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn seed_user(pool: &SqlitePool, email: &str) -> String {
        let repo = UserRepository::new(pool);
        let user = repo
            .create_user(CreateUser {
                id: Uuid::now_v7().to_string(),
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: "$2b$12$unused-hash-for-attendance".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();
        user.id
    }

    #[tokio::test]
    async fn test_mark_defaults_to_present() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "worker@example.com").await;
        let service = AttendanceService::new(&pool);

        let record = service.mark_attendance(&user_id, None).await.unwrap();

        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.day, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn test_second_mark_same_day_rejected() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool, "worker@example.com").await;
        let service = AttendanceService::new(&pool);

        service.mark_attendance(&user_id, None).await.unwrap();

        let err = service
            .mark_attendance(&user_id, Some(AttendanceStatus::Absent))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let (records, total) = service
            .list_for_user(&user_id, &PaginationFilter::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_users_mark_independently() {
        let pool = test_pool().await;
        let first = seed_user(&pool, "first@example.com").await;
        let second = seed_user(&pool, "second@example.com").await;
        let service = AttendanceService::new(&pool);

        service.mark_attendance(&first, None).await.unwrap();
        service
            .mark_attendance(&second, Some(AttendanceStatus::Absent))
            .await
            .unwrap();

        let (records, _) = service
            .list_for_user(&second, &PaginationFilter::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Absent);
    }
}
