//! Manual income and expense ledger routes.

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
    TransactionFilter, TransactionInput, TransactionRepository, TransactionStats,
    entities::{
        sea_orm_active_enums::{PaymentMethod, TransactionType},
        transactions,
    },
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

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schools/{school}/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/schools/{school}/transactions-dashboard-stats",
            get(dashboard_stats),
        )
        .route(
            "/schools/{school}/transactions/{transaction}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
    /// Student.
    pub student_id: Option<Uuid>,
    /// Income or expense.
    pub transaction_type: Option<TransactionType>,
    /// Settlement method.
    pub payment_method: Option<PaymentMethod>,
    /// Category contains.
    pub category: Option<String>,
    /// Earliest date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub to: Option<NaiveDate>,
}

impl From<TransactionQuery> for TransactionFilter {
    fn from(q: TransactionQuery) -> Self {
        Self {
            section_id: q.section_id,
            session_id: q.session_id,
            term_id: q.term_id,
            student_id: q.student_id,
            transaction_type: q.transaction_type,
            payment_method: q.payment_method,
            category: q.category,
            from: q.from,
            to: q.to,
        }
    }
}

/// Request body for recording or replacing a transaction.
#[derive(Debug, Deserialize, Validate)]
pub struct TransactionRequest {
    /// Section.
    pub section_id: Uuid,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
    /// Student the money relates to.
    pub student_id: Option<Uuid>,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Amount, greater than zero.
    pub amount: Decimal,
    /// Settlement method.
    pub payment_method: PaymentMethod,
    /// Category; fee income uses the configured fee marker.
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Teller or cheque number.
    #[validate(length(max = 100, message = "Reference number must be at most 100 characters"))]
    pub reference_number: Option<String>,
    /// Day the money moved.
    pub transaction_date: NaiveDate,
    /// Gateway payment this entry records.
    pub payment_id: Option<Uuid>,
}

impl From<TransactionRequest> for TransactionInput {
    fn from(req: TransactionRequest) -> Self {
        Self {
            section_id: req.section_id,
            session_id: req.session_id,
            term_id: req.term_id,
            student_id: req.student_id,
            transaction_type: req.transaction_type,
            amount: req.amount,
            payment_method: req.payment_method,
            category: req.category,
            description: req.description,
            reference_number: req.reference_number,
            transaction_date: req.transaction_date,
            payment_id: req.payment_id,
        }
    }
}

/// GET `/schools/{school}/transactions` - List ledger entries.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<TransactionQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<transactions::Model>>> {
    auth.require(UserRole::can_manage_finance)?;
    let rows = TransactionRepository::new(state.conn())
        .list(school_id, &query.into(), &page)
        .await?;
    Ok(Json(rows.into()))
}

/// GET `/schools/{school}/transactions-dashboard-stats` - Income and expense
/// totals for the filter.
async fn dashboard_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<TransactionStats>> {
    auth.require(UserRole::can_manage_finance)?;
    let stats = TransactionRepository::new(state.conn())
        .stats(school_id, &query.into())
        .await?;
    Ok(Json(stats))
}

/// POST `/schools/{school}/transactions` - Record an entry.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<TransactionRequest>,
) -> ApiResult<(StatusCode, Json<transactions::Model>)> {
    auth.require(UserRole::can_manage_finance)?;
    let transaction = TransactionRepository::new(state.conn())
        .create(school_id, auth.user_id(), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET `/schools/{school}/transactions/{transaction}` - Show an entry.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<transactions::Model>> {
    auth.require(UserRole::can_manage_finance)?;
    TransactionRepository::new(state.conn())
        .find(school_id, transaction_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Transaction not found"))
}

/// PUT `/schools/{school}/transactions/{transaction}` - Replace an entry.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, transaction_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<TransactionRequest>,
) -> ApiResult<Json<transactions::Model>> {
    auth.require(UserRole::can_manage_finance)?;
    let transaction = TransactionRepository::new(state.conn())
        .update(school_id, transaction_id, payload.into())
        .await?;
    Ok(Json(transaction))
}

/// DELETE `/schools/{school}/transactions/{transaction}` - Remove an entry.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_finance)?;
    TransactionRepository::new(state.conn())
        .delete(school_id, transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
