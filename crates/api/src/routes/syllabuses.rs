//! Syllabus routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use scholaris_core::auth::UserRole;
use scholaris_core::planning::SyllabusStatus;
use scholaris_db::{SyllabusFilter, SyllabusInput, SyllabusRepository, entities::syllabuses};
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

/// Creates the syllabus routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/syllabuses", get(list_topics).post(create_topic))
        .route(
            "/schools/{school}/syllabuses/{topic}",
            get(get_topic).put(update_topic).delete(delete_topic),
        )
}

/// Query parameters for listing syllabus topics.
#[derive(Debug, Deserialize)]
pub struct SyllabusQuery {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Subject.
    pub subject_id: Option<Uuid>,
    /// Coverage.
    pub status: Option<SyllabusStatus>,
}

/// Request body for creating or replacing a syllabus topic.
#[derive(Debug, Deserialize, Validate)]
pub struct SyllabusRequest {
    /// Class.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Topic title.
    #[validate(length(min = 1, max = 255, message = "Topic is required"))]
    pub topic: String,
    /// What the topic covers.
    pub description: Option<String>,
    /// Coverage, `pending` when omitted.
    #[serde(default = "default_status")]
    pub status: SyllabusStatus,
    /// Day the topic was finished.
    pub completion_date: Option<NaiveDate>,
}

const fn default_status() -> SyllabusStatus {
    SyllabusStatus::Pending
}

impl From<SyllabusRequest> for SyllabusInput {
    fn from(req: SyllabusRequest) -> Self {
        Self {
            class_id: req.class_id,
            subject_id: req.subject_id,
            topic: req.topic.trim().to_string(),
            description: req.description,
            status: req.status,
            completion_date: req.completion_date,
        }
    }
}

async fn list_topics(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<SyllabusQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<syllabuses::Model>>> {
    auth.require(UserRole::is_staff)?;
    let filter = SyllabusFilter {
        section_id: query.section_id,
        class_id: query.class_id,
        subject_id: query.subject_id,
        status: query.status,
    };
    let topics = SyllabusRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;
    Ok(Json(topics.into()))
}

async fn get_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, topic_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<syllabuses::Model>> {
    auth.require(UserRole::is_staff)?;
    SyllabusRepository::new(state.conn())
        .find(school_id, topic_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Syllabus topic not found"))
}

async fn create_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SyllabusRequest>,
) -> ApiResult<(StatusCode, Json<syllabuses::Model>)> {
    auth.require(UserRole::can_teach)?;
    let topic = SyllabusRepository::new(state.conn())
        .create(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

async fn update_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, topic_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<SyllabusRequest>,
) -> ApiResult<Json<syllabuses::Model>> {
    auth.require(UserRole::can_teach)?;
    let topic = SyllabusRepository::new(state.conn())
        .update(school_id, topic_id, payload.into())
        .await?;
    Ok(Json(topic))
}

async fn delete_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, topic_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_teach)?;
    SyllabusRepository::new(state.conn())
        .delete(school_id, topic_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
