//! Subject routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use scholaris_core::auth::UserRole;
use scholaris_db::{SubjectInput, SubjectRepository, entities::subjects};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the subject routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/subjects", get(list_subjects).post(create_subject))
        .route(
            "/schools/{school}/subjects/{subject}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
}

/// Query parameters for listing subjects.
#[derive(Debug, Deserialize)]
pub struct ListSubjectsQuery {
    /// Only subjects of this section.
    pub section_id: Option<Uuid>,
    /// Only subjects of this class.
    pub class_id: Option<Uuid>,
}

/// Request body for creating or replacing a subject.
#[derive(Debug, Deserialize, Validate)]
pub struct SubjectRequest {
    /// Section the subject is taught in.
    pub section_id: Uuid,
    /// Class, when the subject is class specific.
    pub class_id: Option<Uuid>,
    /// Name, e.g. "Mathematics".
    #[validate(length(min = 1, max = 100, message = "Subject name is required"))]
    pub name: String,
    /// Short code, e.g. "MTH".
    #[validate(length(max = 20, message = "Subject code must be at most 20 characters"))]
    pub code: Option<String>,
}

impl From<SubjectRequest> for SubjectInput {
    fn from(req: SubjectRequest) -> Self {
        Self {
            section_id: req.section_id,
            class_id: req.class_id,
            name: req.name.trim().to_string(),
            code: req.code,
        }
    }
}

async fn list_subjects(
    State(state): State<AppState>,
    Path(school_id): Path<Uuid>,
    Query(query): Query<ListSubjectsQuery>,
) -> ApiResult<Json<Vec<subjects::Model>>> {
    let subjects = SubjectRepository::new(state.conn())
        .list(school_id, query.section_id, query.class_id)
        .await?;
    Ok(Json(subjects))
}

async fn get_subject(
    State(state): State<AppState>,
    Path((school_id, subject_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<subjects::Model>> {
    SubjectRepository::new(state.conn())
        .find(school_id, subject_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Subject not found"))
}

async fn create_subject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SubjectRequest>,
) -> ApiResult<(StatusCode, Json<subjects::Model>)> {
    auth.require(UserRole::can_manage_school)?;
    let subject = SubjectRepository::new(state.conn())
        .create(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

async fn update_subject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, subject_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<SubjectRequest>,
) -> ApiResult<Json<subjects::Model>> {
    auth.require(UserRole::can_manage_school)?;
    let subject = SubjectRepository::new(state.conn())
        .update(school_id, subject_id, payload.into())
        .await?;
    Ok(Json(subject))
}

async fn delete_subject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, subject_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    SubjectRepository::new(state.conn())
        .delete(school_id, subject_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
