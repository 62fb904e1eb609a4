//! Lesson plan routes.
//!
//! Teachers write plans and submit them; principals and proprietors approve
//! or reject them with remarks.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use scholaris_core::auth::UserRole;
use scholaris_core::planning::LessonPlanStatus;
use scholaris_db::{
    LessonPlanFilter, LessonPlanInput, LessonPlanRepository, LessonPlanReview,
    entities::lesson_plans,
};
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the lesson plan routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schools/{school}/lesson-plans",
            get(list_plans).post(create_plan),
        )
        .route(
            "/schools/{school}/lesson-plans/{plan}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/schools/{school}/lesson-plans/{plan}/review", post(review_plan))
}

/// Query parameters for listing lesson plans.
#[derive(Debug, Deserialize)]
pub struct LessonPlanQuery {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Author.
    pub teacher_id: Option<Uuid>,
    /// Status.
    pub status: Option<LessonPlanStatus>,
}

/// Request body for writing or reworking a lesson plan.
#[derive(Debug, Deserialize, Validate)]
pub struct LessonPlanRequest {
    /// Class taught.
    pub class_id: Uuid,
    /// Subject taught.
    pub subject_id: Uuid,
    /// Title.
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    /// Plan body.
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    /// Week of term.
    #[validate(range(min = 1, max = 52, message = "Week number must be between 1 and 52"))]
    pub week_number: i32,
    /// `draft` or `submitted`; new plans are submitted unless told otherwise.
    #[serde(default = "default_status")]
    pub status: LessonPlanStatus,
}

const fn default_status() -> LessonPlanStatus {
    LessonPlanStatus::Submitted
}

impl From<LessonPlanRequest> for LessonPlanInput {
    fn from(req: LessonPlanRequest) -> Self {
        Self {
            class_id: req.class_id,
            subject_id: req.subject_id,
            title: req.title.trim().to_string(),
            content: req.content,
            week_number: req.week_number,
            status: req.status,
        }
    }
}

/// Request body for reviewing a lesson plan.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    /// `approved` or `rejected`.
    pub status: LessonPlanStatus,
    /// Feedback for the author.
    #[validate(length(max = 2000, message = "Remarks must be at most 2000 characters"))]
    pub remarks: Option<String>,
}

/// GET `/schools/{school}/lesson-plans` - List lesson plans.
async fn list_plans(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<LessonPlanQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<lesson_plans::Model>>> {
    auth.require(UserRole::is_staff)?;
    let filter = LessonPlanFilter {
        section_id: query.section_id,
        class_id: query.class_id,
        teacher_id: query.teacher_id,
        status: query.status,
    };
    let plans = LessonPlanRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;
    Ok(Json(plans.into()))
}

/// POST `/schools/{school}/lesson-plans` - Write a lesson plan.
async fn create_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<LessonPlanRequest>,
) -> ApiResult<(StatusCode, Json<lesson_plans::Model>)> {
    auth.require(UserRole::can_teach)?;
    let plan = LessonPlanRepository::new(state.conn())
        .create(school_id, auth.user_id(), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// GET `/schools/{school}/lesson-plans/{plan}` - Show a lesson plan.
async fn get_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, plan_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<lesson_plans::Model>> {
    auth.require(UserRole::is_staff)?;
    LessonPlanRepository::new(state.conn())
        .find(school_id, plan_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Lesson plan not found"))
}

/// PUT `/schools/{school}/lesson-plans/{plan}` - Rework a plan.
async fn update_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, plan_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<LessonPlanRequest>,
) -> ApiResult<Json<lesson_plans::Model>> {
    auth.require(UserRole::can_teach)?;
    let plan = LessonPlanRepository::new(state.conn())
        .update(school_id, plan_id, auth.user_id(), payload.into())
        .await?;
    Ok(Json(plan))
}

/// POST `/schools/{school}/lesson-plans/{plan}/review` - Approve or reject.
async fn review_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, plan_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> ApiResult<Json<lesson_plans::Model>> {
    auth.require(UserRole::can_manage_school)?;
    let review = LessonPlanReview {
        status: payload.status,
        remarks: payload.remarks,
    };
    let plan = LessonPlanRepository::new(state.conn())
        .review(school_id, plan_id, auth.user_id(), review)
        .await?;
    Ok(Json(plan))
}

/// DELETE `/schools/{school}/lesson-plans/{plan}` - Remove a plan.
async fn delete_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, plan_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let role = auth.require(UserRole::can_teach)?;
    LessonPlanRepository::new(state.conn())
        .delete(school_id, plan_id, auth.user_id(), role.can_manage_school())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
