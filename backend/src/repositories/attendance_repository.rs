//! Database repository for attendance records.

use crate::api::common::PaginationFilter;
use crate::database::models::AttendanceRecord;
use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;

const ATTENDANCE_COLUMNS: &str = "id, user_id, day, status, marked_at";

/// Repository for attendance database operations.
pub struct AttendanceRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> AttendanceRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts an attendance record. The UNIQUE(user_id, day) index rejects
    /// a second mark for the same day.
    pub async fn create_record(&self, record: &AttendanceRecord) -> Result<AttendanceRecord> {
        let created = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "INSERT INTO attendance (id, user_id, day, status, marked_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {ATTENDANCE_COLUMNS}"
        ))
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.day)
        .bind(record.status)
        .bind(record.marked_at)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_record_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND day = ?"
        ))
        .bind(user_id)
        .bind(day)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// A user's records, most recent day first.
    pub async fn get_records_by_user(
        &self,
        user_id: &str,
        pagination: &PaginationFilter,
    ) -> Result<Vec<AttendanceRecord>> {
        let limit = pagination.limit() as i64;
        let offset = pagination.offset() as i64;

        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? \
             ORDER BY day DESC LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    pub async fn count_records_by_user(&self, user_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }
}
