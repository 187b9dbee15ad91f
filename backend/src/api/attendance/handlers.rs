//! Handler functions for attendance API endpoints.
//!
//! These functions process attendance marking and history requests for the
//! authenticated user, plus admin access to any user's records.

use crate::api::common::{ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http};
use crate::auth::models::AuthUser;
use crate::database::models::{AttendanceRecord, MarkAttendanceRequest};
use crate::services::attendance_service::AttendanceService;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use sqlx::SqlitePool;

/// Marks the authenticated user's attendance for the current day.
#[axum::debug_handler]
pub async fn mark_attendance(
    Extension(user): Extension<AuthUser>,
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<MarkAttendanceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AttendanceRecord>>), (StatusCode, String)> {
    let attendance_service = AttendanceService::new(&pool);
    let record = attendance_service
        .mark_attendance(&user.id, payload.status)
        .await
        .map_err(service_error_to_http)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(record, "Attendance marked successfully")),
    ))
}

/// Lists the authenticated user's attendance history.
#[axum::debug_handler]
pub async fn list_my_attendance(
    Extension(user): Extension<AuthUser>,
    Extension(pool): Extension<SqlitePool>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecord>>>, (StatusCode, String)> {
    let attendance_service = AttendanceService::new(&pool);
    let (records, total) = attendance_service
        .list_for_user(&user.id, &pagination)
        .await
        .map_err(service_error_to_http)?;

    let meta = PaginationMeta::from_filter(&pagination, total);
    Ok(Json(ApiResponse::paginated(
        records,
        meta,
        "Attendance retrieved successfully",
    )))
}

/// Lists any user's attendance history (admin only, enforced by the route).
#[axum::debug_handler]
pub async fn list_user_attendance(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecord>>>, (StatusCode, String)> {
    let attendance_service = AttendanceService::new(&pool);
    let (records, total) = attendance_service
        .list_for_user(&id, &pagination)
        .await
        .map_err(service_error_to_http)?;

    let meta = PaginationMeta::from_filter(&pagination, total);
    Ok(Json(ApiResponse::paginated(
        records,
        meta,
        "Attendance retrieved successfully",
    )))
}
