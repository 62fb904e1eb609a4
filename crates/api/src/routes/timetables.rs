//! Timetable routes.
//!
//! Teachers listing the timetable see their own lessons unless they ask for
//! a class or another teacher.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveTime;
use scholaris_core::auth::UserRole;
use scholaris_core::planning::Weekday;
use scholaris_db::{TimetableFilter, TimetableInput, TimetableRepository, entities::timetables};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the timetable routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/timetables", get(list_entries).post(create_entry))
        .route(
            "/schools/{school}/timetables/{entry}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}

/// Query parameters for listing timetable entries.
#[derive(Debug, Deserialize)]
pub struct TimetableQuery {
    /// Class.
    pub class_id: Option<Uuid>,
    /// Teacher.
    pub teacher_id: Option<Uuid>,
    /// Day of the week.
    pub day: Option<Weekday>,
}

/// Request body for creating or replacing a timetable entry.
#[derive(Debug, Deserialize, Validate)]
pub struct TimetableRequest {
    /// Class.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Teacher teaching the lesson.
    pub teacher_id: Uuid,
    /// Day of the week.
    pub day: Weekday,
    /// Start of the period, e.g. "08:00:00".
    pub start_time: NaiveTime,
    /// End of the period.
    pub end_time: NaiveTime,
}

impl From<TimetableRequest> for TimetableInput {
    fn from(req: TimetableRequest) -> Self {
        Self {
            class_id: req.class_id,
            subject_id: req.subject_id,
            teacher_id: req.teacher_id,
            day: req.day,
            start_time: req.start_time,
            end_time: req.end_time,
        }
    }
}

/// GET `/schools/{school}/timetables` - Lessons by day and start time.
async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<TimetableQuery>,
) -> ApiResult<Json<Vec<timetables::Model>>> {
    let role = auth.require(UserRole::is_staff)?;
    let own = role == UserRole::Teacher && query.class_id.is_none();
    let filter = TimetableFilter {
        class_id: query.class_id,
        teacher_id: query.teacher_id.or(own.then_some(auth.user_id())),
        day: query.day,
    };
    let entries = TimetableRepository::new(state.conn())
        .list(school_id, &filter)
        .await?;
    Ok(Json(entries))
}

async fn get_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, entry_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<timetables::Model>> {
    auth.require(UserRole::is_staff)?;
    TimetableRepository::new(state.conn())
        .find(school_id, entry_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Timetable entry not found"))
}

/// POST `/schools/{school}/timetables` - Schedule a lesson.
///
/// Responds 409 when the class or the teacher is already busy.
async fn create_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<TimetableRequest>,
) -> ApiResult<(StatusCode, Json<timetables::Model>)> {
    auth.require(UserRole::can_manage_school)?;
    let entry = TimetableRepository::new(state.conn())
        .create(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, entry_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<TimetableRequest>,
) -> ApiResult<Json<timetables::Model>> {
    auth.require(UserRole::can_manage_school)?;
    let entry = TimetableRepository::new(state.conn())
        .update(school_id, entry_id, payload.into())
        .await?;
    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, entry_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    TimetableRepository::new(state.conn())
        .delete(school_id, entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
