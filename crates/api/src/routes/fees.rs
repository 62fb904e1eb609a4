//! Fee definition routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use scholaris_core::auth::UserRole;
use scholaris_core::fees::FeeScopeKind;
use scholaris_db::{FeeFilter, FeeInput, FeeRepository, FeeSummary, entities::fees};
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

/// Creates the fee routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/fees", get(list_fees).post(create_fee))
        .route("/schools/{school}/fees-summary", get(fee_summary))
        .route(
            "/schools/{school}/fees/{fee}",
            get(get_fee).put(update_fee).delete(delete_fee),
        )
}

/// Query parameters for listing fees.
#[derive(Debug, Deserialize)]
pub struct FeeQuery {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Scope kind.
    pub fee_scope: Option<FeeScopeKind>,
    /// Active flag.
    pub is_active: Option<bool>,
}

impl From<FeeQuery> for FeeFilter {
    fn from(q: FeeQuery) -> Self {
        Self {
            section_id: q.section_id,
            session_id: q.session_id,
            term_id: q.term_id,
            class_id: q.class_id,
            fee_scope: q.fee_scope.map(Into::into),
            is_active: q.is_active,
        }
    }
}

/// Request body for creating or replacing a fee.
#[derive(Debug, Deserialize, Validate)]
pub struct FeeRequest {
    /// Section the fee belongs to.
    pub section_id: Uuid,
    /// Academic session.
    pub session_id: Uuid,
    /// Term.
    pub term_id: Uuid,
    /// Who the fee is charged to.
    pub fee_scope: FeeScopeKind,
    /// Class, required for class fees.
    pub class_id: Option<Uuid>,
    /// Student, required for student fees.
    pub student_id: Option<Uuid>,
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Fee name is required"))]
    pub fee_name: String,
    /// Amount charged.
    pub amount: Decimal,
    /// Description.
    pub description: Option<String>,
    /// Active flag, defaults to true.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl From<FeeRequest> for FeeInput {
    fn from(req: FeeRequest) -> Self {
        Self {
            section_id: req.section_id,
            session_id: req.session_id,
            term_id: req.term_id,
            fee_scope: req.fee_scope,
            class_id: req.class_id,
            student_id: req.student_id,
            fee_name: req.fee_name.trim().to_string(),
            amount: req.amount,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

/// GET `/schools/{school}/fees` - List fees.
async fn list_fees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<FeeQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<fees::Model>>> {
    auth.require(UserRole::is_staff)?;
    let fees = FeeRepository::new(state.conn())
        .list(school_id, &query.into(), &page)
        .await?;
    Ok(Json(fees.into()))
}

/// GET `/schools/{school}/fees-summary` - Fee counts and totals by scope.
async fn fee_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<FeeQuery>,
) -> ApiResult<Json<FeeSummary>> {
    auth.require(UserRole::can_manage_finance)?;
    let summary = FeeRepository::new(state.conn())
        .summary(school_id, &query.into())
        .await?;
    Ok(Json(summary))
}

/// POST `/schools/{school}/fees` - Define a fee.
async fn create_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<FeeRequest>,
) -> ApiResult<(StatusCode, Json<fees::Model>)> {
    auth.require(UserRole::can_manage_finance)?;
    let fee = FeeRepository::new(state.conn())
        .create(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(fee)))
}

/// GET `/schools/{school}/fees/{fee}` - Show a fee.
async fn get_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, fee_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<fees::Model>> {
    auth.require(UserRole::is_staff)?;
    FeeRepository::new(state.conn())
        .find(school_id, fee_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Fee not found"))
}

/// PUT `/schools/{school}/fees/{fee}` - Replace a fee.
async fn update_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, fee_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<FeeRequest>,
) -> ApiResult<Json<fees::Model>> {
    auth.require(UserRole::can_manage_finance)?;
    let fee = FeeRepository::new(state.conn())
        .update(school_id, fee_id, payload.into())
        .await?;
    Ok(Json(fee))
}

/// DELETE `/schools/{school}/fees/{fee}` - Remove a fee.
async fn delete_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, fee_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_finance)?;
    FeeRepository::new(state.conn())
        .delete(school_id, fee_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
