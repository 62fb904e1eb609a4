//! Financial and academic report routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::NaiveDate;
use scholaris_core::auth::UserRole;
use scholaris_core::balance::CollectionSummary;
use scholaris_db::{DebtorRow, FinancialSummary, MethodTotal, ReportCard, ReportRepository};
use serde::Deserialize;
use uuid::Uuid;

use super::students::{PeriodQuery, visible_student};
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/reports/debtors", get(debtors))
        .route("/schools/{school}/reports/fee-collection", get(fee_collection))
        .route(
            "/schools/{school}/reports/financial-summary",
            get(financial_summary),
        )
        .route("/schools/{school}/reports/payment-methods", get(payment_methods))
        .route(
            "/schools/{school}/reports/academic-report-card/{student}",
            get(report_card),
        )
}

/// Restricts the debtor list to one section.
#[derive(Debug, Deserialize)]
pub struct DebtorQuery {
    /// Section.
    pub section_id: Option<Uuid>,
}

/// Inclusive date range.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// First day.
    pub from: Option<NaiveDate>,
    /// Last day.
    pub to: Option<NaiveDate>,
}

fn reports(state: &AppState) -> ReportRepository {
    ReportRepository::new(state.conn(), &state.settings.fee_marker)
}

/// GET `/schools/{school}/reports/debtors` - Students who still owe fees.
async fn debtors(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<DebtorQuery>,
) -> ApiResult<Json<Vec<DebtorRow>>> {
    auth.require(UserRole::can_manage_finance)?;
    Ok(Json(reports(&state).debtors(school_id, query.section_id).await?))
}

/// GET `/schools/{school}/reports/fee-collection` - Expected against collected.
async fn fee_collection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
) -> ApiResult<Json<CollectionSummary>> {
    auth.require(UserRole::can_manage_finance)?;
    Ok(Json(reports(&state).fee_collection(school_id).await?))
}

/// GET `/schools/{school}/reports/financial-summary` - Income and expenses.
async fn financial_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<FinancialSummary>> {
    auth.require(UserRole::can_manage_finance)?;
    let summary = reports(&state)
        .financial_summary(school_id, range.from, range.to)
        .await?;
    Ok(Json(summary))
}

/// GET `/schools/{school}/reports/payment-methods` - Income by method.
async fn payment_methods(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<Vec<MethodTotal>>> {
    auth.require(UserRole::can_manage_finance)?;
    let totals = reports(&state)
        .payment_methods(school_id, range.from, range.to)
        .await?;
    Ok(Json(totals))
}

/// GET `/schools/{school}/reports/academic-report-card/{student}` - Graded
/// exams of a student.
async fn report_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
    Query(period): Query<PeriodQuery>,
) -> ApiResult<Json<ReportCard>> {
    visible_student(&state, &auth, school_id, student_id).await?;
    let card = reports(&state)
        .report_card(school_id, student_id, period.into())
        .await?;
    Ok(Json(card))
}
