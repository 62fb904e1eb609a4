//! Attendance routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::NaiveDate;
use scholaris_core::attendance::AttendanceSummary;
use scholaris_core::auth::UserRole;
use scholaris_db::{
    AttendanceMark, AttendanceRepository,
    entities::{attendances, sea_orm_active_enums::AttendanceStatus},
};
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::students::visible_student;
use crate::{AppState, error::ApiResult, extractors::ValidatedJson, middleware::AuthUser};

/// Creates the attendance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schools/{school}/classes/{class}/attendance",
            get(class_register).post(mark_register),
        )
        .route(
            "/schools/{school}/students/{student}/attendance",
            get(student_history),
        )
        .route(
            "/schools/{school}/sections/{section}/attendance-summary",
            get(section_summary),
        )
}

/// Selects one day.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Day of the register.
    pub date: NaiveDate,
}

/// Bounds a history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Earliest day, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest day, inclusive.
    pub to: Option<NaiveDate>,
}

/// One student's mark.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct MarkRow {
    /// Student.
    pub student_id: Uuid,
    /// Status.
    pub status: AttendanceStatus,
    /// Remark.
    #[validate(length(max = 255, message = "Remark must be at most 255 characters"))]
    pub remark: Option<String>,
}

/// Request body for recording a class register.
#[derive(Debug, Deserialize, Validate)]
pub struct MarkRegisterRequest {
    /// Day of the register.
    pub date: NaiveDate,
    /// Marks, one per student.
    #[validate(length(min = 1, message = "At least one record is required"), nested)]
    pub records: Vec<MarkRow>,
}

/// GET `/schools/{school}/classes/{class}/attendance?date=` - A day's register.
async fn class_register(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, class_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<attendances::Model>>> {
    auth.require(UserRole::is_staff)?;
    let rows = AttendanceRepository::new(state.conn())
        .for_class(school_id, class_id, query.date)
        .await?;
    Ok(Json(rows))
}

/// POST `/schools/{school}/classes/{class}/attendance` - Record a register.
///
/// All marks are saved or none are.
async fn mark_register(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, class_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<MarkRegisterRequest>,
) -> ApiResult<Json<Vec<attendances::Model>>> {
    auth.require(UserRole::can_teach)?;
    let marks = payload
        .records
        .into_iter()
        .map(|r| AttendanceMark {
            student_id: r.student_id,
            status: r.status,
            remark: r.remark,
        })
        .collect();

    let saved = AttendanceRepository::new(state.conn())
        .mark(school_id, class_id, payload.date, auth.user_id(), marks)
        .await?;
    Ok(Json(saved))
}

/// GET `/schools/{school}/students/{student}/attendance` - A student's history.
async fn student_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<HistoryQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<attendances::Model>>> {
    visible_student(&state, &auth, school_id, student_id).await?;
    let rows = AttendanceRepository::new(state.conn())
        .history(school_id, student_id, query.from, query.to, &page)
        .await?;
    Ok(Json(rows.into()))
}

/// GET `/schools/{school}/sections/{section}/attendance-summary?date=` -
/// Head counts for a section on one day.
async fn section_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, section_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<AttendanceSummary>> {
    auth.require(UserRole::is_staff)?;
    let summary = AttendanceRepository::new(state.conn())
        .section_summary(school_id, section_id, query.date)
        .await?;
    Ok(Json(summary))
}
