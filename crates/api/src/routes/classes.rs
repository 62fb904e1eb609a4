//! Class routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use scholaris_core::auth::UserRole;
use scholaris_db::{ClassInput, ClassRepository, entities::classes};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the class routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/classes", get(list_classes).post(create_class))
        .route(
            "/schools/{school}/classes/{class}",
            get(get_class).put(update_class).delete(delete_class),
        )
}

/// Query parameters for listing classes.
#[derive(Debug, Deserialize)]
pub struct ListClassesQuery {
    /// Only classes of this section.
    pub section_id: Option<Uuid>,
}

/// Request body for creating or replacing a class.
#[derive(Debug, Deserialize, Validate)]
pub struct ClassRequest {
    /// Section the class belongs to.
    pub section_id: Uuid,
    /// Class name, e.g. "Primary 5".
    #[validate(length(min = 1, max = 100, message = "Class name is required"))]
    pub class_name: String,
    /// Description.
    pub description: Option<String>,
    /// Form teacher.
    pub form_teacher_id: Option<Uuid>,
    /// Maximum number of students.
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
    /// Active flag (default: true).
    pub is_active: Option<bool>,
}

impl From<ClassRequest> for ClassInput {
    fn from(req: ClassRequest) -> Self {
        Self {
            section_id: req.section_id,
            class_name: req.class_name.trim().to_string(),
            description: req.description,
            form_teacher_id: req.form_teacher_id,
            capacity: req.capacity,
            is_active: req.is_active.unwrap_or(true),
        }
    }
}

/// A class with its head count.
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    /// Class row.
    #[serde(flatten)]
    pub class: classes::Model,
    /// Students assigned to the class.
    pub student_count: u64,
}

async fn list_classes(
    State(state): State<AppState>,
    Path(school_id): Path<Uuid>,
    Query(query): Query<ListClassesQuery>,
) -> ApiResult<Json<Vec<classes::Model>>> {
    let classes = ClassRepository::new(state.conn())
        .list(school_id, query.section_id)
        .await?;
    Ok(Json(classes))
}

async fn get_class(
    State(state): State<AppState>,
    Path((school_id, class_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ClassResponse>> {
    let repo = ClassRepository::new(state.conn());
    let class = repo
        .find(school_id, class_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Class not found"))?;
    let student_count = repo.student_count(class.id).await?;
    Ok(Json(ClassResponse {
        class,
        student_count,
    }))
}

async fn create_class(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ClassRequest>,
) -> ApiResult<(StatusCode, Json<classes::Model>)> {
    auth.require(UserRole::can_manage_school)?;
    let class = ClassRepository::new(state.conn())
        .create(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(class)))
}

async fn update_class(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, class_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<ClassRequest>,
) -> ApiResult<Json<classes::Model>> {
    auth.require(UserRole::can_manage_school)?;
    let class = ClassRepository::new(state.conn())
        .update(school_id, class_id, payload.into())
        .await?;
    Ok(Json(class))
}

async fn delete_class(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, class_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    ClassRepository::new(state.conn())
        .delete(school_id, class_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
