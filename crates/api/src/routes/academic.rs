//! Academic session and term routes.
//!
//! Activating a session or term deactivates its siblings.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use scholaris_core::auth::UserRole;
use scholaris_db::{
    AcademicRepository, SessionInput, TermInput,
    entities::{academic_sessions, terms},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the session and term routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/sessions", get(list_sessions).post(create_session))
        .route(
            "/schools/{school}/sessions/{session}",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/schools/{school}/terms", get(list_terms).post(create_term))
        .route(
            "/schools/{school}/terms/{term}",
            get(get_term).put(update_term).delete(delete_term),
        )
}

/// Query parameters for listing sessions.
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Only sessions of this section.
    pub section_id: Option<Uuid>,
}

/// Query parameters for listing terms.
#[derive(Debug, Deserialize)]
pub struct ListTermsQuery {
    /// Only terms of this session.
    pub session_id: Option<Uuid>,
}

/// Request body for creating or replacing a session.
#[derive(Debug, Deserialize, Validate)]
pub struct SessionRequest {
    /// Section the session belongs to.
    pub section_id: Uuid,
    /// Name, e.g. "2024/2025".
    #[validate(length(min = 1, max = 100, message = "Session name is required"))]
    pub session_name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Whether this is the current session (default: false).
    pub is_active: Option<bool>,
}

/// Request body for creating or replacing a term.
#[derive(Debug, Deserialize, Validate)]
pub struct TermRequest {
    /// Session the term belongs to.
    pub session_id: Uuid,
    /// Name, e.g. "First Term".
    #[validate(length(min = 1, max = 100, message = "Term name is required"))]
    pub term_name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Whether this is the current term (default: false).
    pub is_active: Option<bool>,
}

impl From<SessionRequest> for SessionInput {
    fn from(req: SessionRequest) -> Self {
        Self {
            section_id: req.section_id,
            session_name: req.session_name.trim().to_string(),
            start_date: req.start_date,
            end_date: req.end_date,
            is_active: req.is_active.unwrap_or(false),
        }
    }
}

impl From<TermRequest> for TermInput {
    fn from(req: TermRequest) -> Self {
        Self {
            session_id: req.session_id,
            term_name: req.term_name.trim().to_string(),
            start_date: req.start_date,
            end_date: req.end_date,
            is_active: req.is_active.unwrap_or(false),
        }
    }
}

async fn list_sessions(
    State(state): State<AppState>,
    Path(school_id): Path<Uuid>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult<Json<Vec<academic_sessions::Model>>> {
    let sessions = AcademicRepository::new(state.conn())
        .list_sessions(school_id, query.section_id)
        .await?;
    Ok(Json(sessions))
}

async fn get_session(
    State(state): State<AppState>,
    Path((school_id, session_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<academic_sessions::Model>> {
    AcademicRepository::new(state.conn())
        .find_session(school_id, session_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Academic session not found"))
}

async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SessionRequest>,
) -> ApiResult<(StatusCode, Json<academic_sessions::Model>)> {
    auth.require(UserRole::can_manage_school)?;
    let session = AcademicRepository::new(state.conn())
        .create_session(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn update_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, session_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<SessionRequest>,
) -> ApiResult<Json<academic_sessions::Model>> {
    auth.require(UserRole::can_manage_school)?;
    let session = AcademicRepository::new(state.conn())
        .update_session(school_id, session_id, payload.into())
        .await?;
    Ok(Json(session))
}

async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, session_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    AcademicRepository::new(state.conn())
        .delete_session(school_id, session_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_terms(
    State(state): State<AppState>,
    Path(school_id): Path<Uuid>,
    Query(query): Query<ListTermsQuery>,
) -> ApiResult<Json<Vec<terms::Model>>> {
    let terms = AcademicRepository::new(state.conn())
        .list_terms(school_id, query.session_id)
        .await?;
    Ok(Json(terms))
}

async fn get_term(
    State(state): State<AppState>,
    Path((school_id, term_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<terms::Model>> {
    AcademicRepository::new(state.conn())
        .find_term(school_id, term_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Term not found"))
}

async fn create_term(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<TermRequest>,
) -> ApiResult<(StatusCode, Json<terms::Model>)> {
    auth.require(UserRole::can_manage_school)?;
    let term = AcademicRepository::new(state.conn())
        .create_term(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(term)))
}

async fn update_term(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, term_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<TermRequest>,
) -> ApiResult<Json<terms::Model>> {
    auth.require(UserRole::can_manage_school)?;
    let term = AcademicRepository::new(state.conn())
        .update_term(school_id, term_id, payload.into())
        .await?;
    Ok(Json(term))
}

async fn delete_term(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, term_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    AcademicRepository::new(state.conn())
        .delete_term(school_id, term_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
