//! Homework routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use scholaris_core::auth::UserRole;
use scholaris_db::{HomeworkFilter, HomeworkInput, HomeworkRepository, entities::homeworks};
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::students::visible_student;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the homework routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/homework", get(list_homework).post(create_homework))
        .route(
            "/schools/{school}/homework/{homework}",
            get(get_homework).put(update_homework).delete(delete_homework),
        )
        .route(
            "/schools/{school}/students/{student}/homework",
            get(student_homework),
        )
}

/// Query parameters for listing homework.
#[derive(Debug, Deserialize)]
pub struct HomeworkQuery {
    /// Class.
    pub class_id: Option<Uuid>,
    /// Subject.
    pub subject_id: Option<Uuid>,
    /// Teacher who set it.
    pub teacher_id: Option<Uuid>,
}

/// Request body for setting or replacing homework.
#[derive(Debug, Deserialize, Validate)]
pub struct HomeworkRequest {
    /// Class.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Title.
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    /// Instructions.
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    /// Day the work is due.
    pub due_date: NaiveDate,
}

impl From<HomeworkRequest> for HomeworkInput {
    fn from(req: HomeworkRequest) -> Self {
        Self {
            class_id: req.class_id,
            subject_id: req.subject_id,
            title: req.title.trim().to_string(),
            description: req.description,
            due_date: req.due_date,
        }
    }
}

/// GET `/schools/{school}/homework` - List homework.
async fn list_homework(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<HomeworkQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<homeworks::Model>>> {
    auth.require(UserRole::is_staff)?;
    let filter = HomeworkFilter {
        class_id: query.class_id,
        subject_id: query.subject_id,
        teacher_id: query.teacher_id,
    };
    let homework = HomeworkRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;
    Ok(Json(homework.into()))
}

/// GET `/schools/{school}/students/{student}/homework` - Homework of a
/// student's class. Parents see their own children only.
async fn student_homework(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<homeworks::Model>>> {
    let student = visible_student(&state, &auth, school_id, student_id).await?;
    let Some(class_id) = student.class_id else {
        return Ok(Json(PageResponse::new(Vec::new(), 1, page.normalized().per_page, 0)));
    };
    let filter = HomeworkFilter {
        class_id: Some(class_id),
        ..HomeworkFilter::default()
    };
    let homework = HomeworkRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;
    Ok(Json(homework.into()))
}

/// POST `/schools/{school}/homework` - Set homework.
async fn create_homework(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<HomeworkRequest>,
) -> ApiResult<(StatusCode, Json<homeworks::Model>)> {
    auth.require(UserRole::can_teach)?;
    let homework = HomeworkRepository::new(state.conn())
        .create(school_id, auth.user_id(), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(homework)))
}

async fn get_homework(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, homework_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<homeworks::Model>> {
    auth.require(UserRole::is_staff)?;
    HomeworkRepository::new(state.conn())
        .find(school_id, homework_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Homework not found"))
}

async fn update_homework(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, homework_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<HomeworkRequest>,
) -> ApiResult<Json<homeworks::Model>> {
    let role = auth.require(UserRole::can_teach)?;
    let homework = HomeworkRepository::new(state.conn())
        .update(
            school_id,
            homework_id,
            auth.user_id(),
            role.can_manage_school(),
            payload.into(),
        )
        .await?;
    Ok(Json(homework))
}

async fn delete_homework(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, homework_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let role = auth.require(UserRole::can_teach)?;
    HomeworkRepository::new(state.conn())
        .delete(school_id, homework_id, auth.user_id(), role.can_manage_school())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
