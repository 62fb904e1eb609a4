//! Section routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use scholaris_core::auth::UserRole;
use scholaris_db::{SectionInput, SectionRepository, entities::sections};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the section routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/sections", get(list_sections).post(create_section))
        .route(
            "/schools/{school}/sections/{section}",
            get(get_section).put(update_section).delete(delete_section),
        )
}

/// Request body for creating or replacing a section.
#[derive(Debug, Deserialize, Validate)]
pub struct SectionRequest {
    /// Section name, e.g. "Primary".
    #[validate(length(min = 1, max = 100, message = "Section name is required"))]
    pub section_name: String,
    /// Description.
    pub description: Option<String>,
    /// Active flag (default: true).
    pub is_active: Option<bool>,
}

impl From<SectionRequest> for SectionInput {
    fn from(req: SectionRequest) -> Self {
        Self {
            section_name: req.section_name.trim().to_string(),
            description: req.description,
            is_active: req.is_active.unwrap_or(true),
        }
    }
}

async fn list_sections(
    State(state): State<AppState>,
    Path(school_id): Path<Uuid>,
) -> ApiResult<Json<Vec<sections::Model>>> {
    Ok(Json(SectionRepository::new(state.conn()).list(school_id).await?))
}

async fn get_section(
    State(state): State<AppState>,
    Path((school_id, section_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<sections::Model>> {
    SectionRepository::new(state.conn())
        .find(school_id, section_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Section not found"))
}

async fn create_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SectionRequest>,
) -> ApiResult<(StatusCode, Json<sections::Model>)> {
    auth.require(UserRole::can_manage_school)?;
    let section = SectionRepository::new(state.conn())
        .create(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(section)))
}

async fn update_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, section_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<SectionRequest>,
) -> ApiResult<Json<sections::Model>> {
    auth.require(UserRole::can_manage_school)?;
    let section = SectionRepository::new(state.conn())
        .update(school_id, section_id, payload.into())
        .await?;
    Ok(Json(section))
}

async fn delete_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, section_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    SectionRepository::new(state.conn())
        .delete(school_id, section_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
