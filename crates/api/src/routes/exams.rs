//! Exam and result routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scholaris_core::auth::UserRole;
use scholaris_db::{
    ExamFilter, ExamInput, ExamRepository, ResultInput,
    entities::{exam_results, exams},
};
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the exam routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/exams", get(list_exams).post(create_exam))
        .route(
            "/schools/{school}/exams/{exam}",
            get(get_exam).put(update_exam).delete(delete_exam),
        )
        .route(
            "/schools/{school}/exams/{exam}/results",
            get(list_results).post(save_results),
        )
}

/// Query parameters for listing exams.
#[derive(Debug, Deserialize)]
pub struct ExamQuery {
    /// Class.
    pub class_id: Option<Uuid>,
    /// Subject.
    pub subject_id: Option<Uuid>,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
}

/// Request body for creating or replacing an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct ExamRequest {
    /// Class sitting the exam.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Academic session.
    pub session_id: Uuid,
    /// Term.
    pub term_id: Uuid,
    /// Title.
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    /// Highest attainable score, defaults to 100.
    #[serde(default = "default_max_score")]
    pub max_score: Decimal,
    /// Day of the exam.
    pub exam_date: Option<NaiveDate>,
}

const fn default_max_score() -> Decimal {
    Decimal::ONE_HUNDRED
}

impl From<ExamRequest> for ExamInput {
    fn from(req: ExamRequest) -> Self {
        Self {
            class_id: req.class_id,
            subject_id: req.subject_id,
            session_id: req.session_id,
            term_id: req.term_id,
            title: req.title.trim().to_string(),
            max_score: req.max_score,
            exam_date: req.exam_date,
        }
    }
}

/// One score in a results batch.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ResultRow {
    /// Student.
    pub student_id: Uuid,
    /// Score, between zero and the exam's maximum.
    pub score: Decimal,
    /// Teacher's remark.
    #[validate(length(max = 500, message = "Remark must be at most 500 characters"))]
    pub remark: Option<String>,
}

/// Request body for saving results.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveResultsRequest {
    /// Scores to upsert.
    #[validate(length(min = 1, message = "At least one result is required"), nested)]
    pub results: Vec<ResultRow>,
}

/// GET `/schools/{school}/exams` - List exams.
async fn list_exams(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<ExamQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<exams::Model>>> {
    auth.require(UserRole::is_staff)?;
    let filter = ExamFilter {
        class_id: query.class_id,
        subject_id: query.subject_id,
        session_id: query.session_id,
        term_id: query.term_id,
    };
    let exams = ExamRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;
    Ok(Json(exams.into()))
}

/// POST `/schools/{school}/exams` - Schedule an exam.
async fn create_exam(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ExamRequest>,
) -> ApiResult<(StatusCode, Json<exams::Model>)> {
    auth.require(UserRole::can_teach)?;
    let exam = ExamRepository::new(state.conn())
        .create(school_id, auth.user_id(), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

/// GET `/schools/{school}/exams/{exam}` - Show an exam.
async fn get_exam(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, exam_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<exams::Model>> {
    auth.require(UserRole::is_staff)?;
    ExamRepository::new(state.conn())
        .find(school_id, exam_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Exam not found"))
}

/// PUT `/schools/{school}/exams/{exam}` - Replace an exam.
async fn update_exam(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, exam_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<ExamRequest>,
) -> ApiResult<Json<exams::Model>> {
    auth.require(UserRole::can_teach)?;
    let exam = ExamRepository::new(state.conn())
        .update(school_id, exam_id, payload.into())
        .await?;
    Ok(Json(exam))
}

/// DELETE `/schools/{school}/exams/{exam}` - Remove an exam and its results.
async fn delete_exam(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, exam_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_teach)?;
    ExamRepository::new(state.conn())
        .delete(school_id, exam_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/schools/{school}/exams/{exam}/results` - Graded results.
async fn list_results(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, exam_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<exam_results::Model>>> {
    auth.require(UserRole::is_staff)?;
    let repo = ExamRepository::new(state.conn());
    repo.find(school_id, exam_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exam not found"))?;
    Ok(Json(repo.results(exam_id).await?))
}

/// POST `/schools/{school}/exams/{exam}/results` - Grade a batch of scores.
///
/// Saving the same batch twice leaves one result per student.
async fn save_results(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, exam_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<SaveResultsRequest>,
) -> ApiResult<Json<Vec<exam_results::Model>>> {
    auth.require(UserRole::can_teach)?;
    let batch = payload
        .results
        .into_iter()
        .map(|r| ResultInput {
            student_id: r.student_id,
            score: r.score,
            remark: r.remark,
        })
        .collect();

    let saved = ExamRepository::new(state.conn())
        .save_results(school_id, exam_id, auth.user_id(), batch)
        .await?;
    Ok(Json(saved))
}
