//! Gateway payment routes.
//!
//! The school is taken from the caller's token. Payments reference a student
//! and a fee, both of which must belong to that school.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use scholaris_core::payment::{
    InitializeRequest, PaymentService, PaymentStatus, VerifyAction, VerifyResponse,
};
use scholaris_db::{
    FeeRepository, NewPayment, PaymentFilter, PaymentRepository, SchoolRepository,
    entities::{payments, sea_orm_active_enums::PaymentStatus as DbPaymentStatus},
};
use scholaris_shared::AppError;
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::students::visible_student;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments))
        .route("/payments/initialize", post(initialize_payment))
        .route("/payments/verify", post(verify_payment))
}

/// Query parameters for listing payments.
#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    /// Paying student; required for parents.
    pub student_id: Option<Uuid>,
    /// Fee.
    pub fee_id: Option<Uuid>,
    /// Status.
    pub status: Option<DbPaymentStatus>,
}

/// Request body for starting a checkout.
#[derive(Debug, Deserialize, Validate)]
pub struct InitializePaymentRequest {
    /// Payer email sent to the gateway.
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    /// Amount in major units.
    pub amount: Decimal,
    /// Student the payment is for.
    pub student_id: Uuid,
    /// Fee being paid.
    pub fee_id: Uuid,
}

/// Checkout data for the client.
#[derive(Debug, Serialize)]
pub struct InitializePaymentResponse {
    /// Hosted checkout page.
    pub authorization_url: String,
    /// Gateway access code.
    pub access_code: String,
    /// Payment reference.
    pub reference: String,
    /// Local pending payment.
    pub payment: payments::Model,
}

/// Request body for verifying a checkout.
///
/// `student_id` and `fee_id` are used when the gateway metadata lacks them.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    /// Payment reference.
    #[validate(length(min = 1, message = "Reference is required"))]
    pub reference: String,
    /// Student fallback.
    pub student_id: Option<Uuid>,
    /// Fee fallback.
    pub fee_id: Option<Uuid>,
}

/// Outcome of a verification.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    /// Always `success`; failures answer with an error.
    pub status: &'static str,
    /// Gateway message.
    pub message: Option<String>,
    /// Settled payment.
    pub payment: payments::Model,
}

/// GET /payments - List payments of the caller's school.
async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PaymentQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<payments::Model>>> {
    let school_id = auth.school_id();
    if !auth.role()?.is_staff() {
        let Some(student_id) = query.student_id else {
            return Err(ApiError::field("student_id", "Student is required"));
        };
        visible_student(&state, &auth, school_id, student_id).await?;
    }

    let filter = PaymentFilter {
        student_id: query.student_id,
        fee_id: query.fee_id,
        status: query.status,
    };
    let rows = PaymentRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;
    Ok(Json(rows.into()))
}

/// POST /payments/initialize - Start a hosted checkout.
///
/// Nothing is stored unless the gateway accepts the request.
async fn initialize_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<InitializePaymentRequest>,
) -> ApiResult<Json<InitializePaymentResponse>> {
    let school_id = auth.school_id();
    visible_student(&state, &auth, school_id, payload.student_id).await?;
    FeeRepository::new(state.conn())
        .find(school_id, payload.fee_id)
        .await?
        .ok_or_else(|| ApiError::field("fee_id", "Fee not found in this school"))?;
    let school = SchoolRepository::new(state.conn())
        .find_by_id(school_id)
        .await?
        .ok_or_else(|| ApiError::not_found("School not found"))?;

    let amount_minor = PaymentService::to_minor_units(payload.amount)?;
    let reference = PaymentService::generate_reference(Utc::now());

    let checkout = state
        .gateway
        .initialize(InitializeRequest {
            email: payload.email.trim().to_string(),
            amount_minor,
            reference: reference.clone(),
            subaccount: school.paystack_subaccount_code,
            callback_url: state.settings.payment_callback_url.clone(),
            metadata: json!({
                "student_id": payload.student_id,
                "fee_id": payload.fee_id,
            }),
        })
        .await?;

    let payment = PaymentRepository::new(state.conn())
        .create_pending(NewPayment {
            student_id: payload.student_id,
            fee_id: payload.fee_id,
            amount: payload.amount,
            reference,
            payment_method: None,
        })
        .await?;

    Ok(Json(InitializePaymentResponse {
        authorization_url: checkout.authorization_url,
        access_code: checkout.access_code,
        reference: payment.reference.clone(),
        payment,
    }))
}

/// POST /payments/verify - Reconcile a checkout with the gateway.
///
/// Safe to repeat: a settled payment is returned unchanged.
async fn verify_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<VerifyPaymentRequest>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    let school_id = auth.school_id();
    let reference = payload.reference.trim().to_string();
    let repo = PaymentRepository::new(state.conn());

    let existing = repo.find_by_reference(&reference).await?;
    if existing.is_some()
        && repo
            .find_by_reference_in_school(school_id, &reference)
            .await?
            .is_none()
    {
        return Err(ApiError::not_found("Payment not found"));
    }
    if let Some(payment) = &existing {
        visible_student(&state, &auth, school_id, payment.student_id).await?;
    }

    let verified = state.gateway.verify(&reference).await?;
    let status = existing
        .as_ref()
        .map(|p| PaymentStatus::from(p.status));

    match PaymentService::decide(status, verified.is_success()) {
        VerifyAction::AlreadySettled => {
            let payment = existing.ok_or_else(|| missing(&reference))?;
            info!(reference = %reference, "Payment already settled");
            Ok(settled(&verified, payment))
        }
        VerifyAction::MarkSuccess => {
            let payment = existing.ok_or_else(|| missing(&reference))?;
            repo.mark_success(
                payment.id,
                verified.paid_at,
                verified.channel.clone(),
                verified.raw.clone(),
            )
            .await?;
            let payment = repo
                .find_by_reference(&reference)
                .await?
                .ok_or_else(|| missing(&reference))?;
            Ok(settled(&verified, payment))
        }
        VerifyAction::CreateSuccess => {
            let student_id = metadata_id(&verified, "student_id")
                .or(payload.student_id)
                .ok_or_else(|| ApiError::field("student_id", "Student is required"))?;
            let fee_id = metadata_id(&verified, "fee_id")
                .or(payload.fee_id)
                .ok_or_else(|| ApiError::field("fee_id", "Fee is required"))?;
            visible_student(&state, &auth, school_id, student_id).await?;
            FeeRepository::new(state.conn())
                .find(school_id, fee_id)
                .await?
                .ok_or_else(|| ApiError::field("fee_id", "Fee not found in this school"))?;

            let payment = repo
                .record_verified(
                    NewPayment {
                        student_id,
                        fee_id,
                        amount: PaymentService::from_minor_units(verified.amount_minor),
                        reference: reference.clone(),
                        payment_method: verified.channel.clone(),
                    },
                    verified.paid_at,
                    verified.raw.clone(),
                )
                .await?;
            Ok(settled(&verified, payment))
        }
        VerifyAction::MarkFailed => {
            if let Some(payment) = &existing {
                repo.mark_failed(payment.id, verified.raw.clone()).await?;
            }
            warn!(reference = %reference, status = %verified.status, "Payment not successful");
            Err(rejected(&verified))
        }
        VerifyAction::Reject => {
            warn!(reference = %reference, status = %verified.status, "Payment not successful");
            Err(rejected(&verified))
        }
    }
}

fn settled(verified: &VerifyResponse, payment: payments::Model) -> Json<VerifyPaymentResponse> {
    Json(VerifyPaymentResponse {
        status: "success",
        message: verified.message.clone(),
        payment,
    })
}

fn rejected(verified: &VerifyResponse) -> ApiError {
    let message = verified
        .message
        .clone()
        .unwrap_or_else(|| format!("Payment {}", verified.status));
    ApiError::new(AppError::Gateway(message))
}

fn missing(reference: &str) -> ApiError {
    ApiError::not_found(format!("Payment {reference} not found"))
}

/// Reads a UUID from the gateway metadata, which may arrive as a string.
fn metadata_id(verified: &VerifyResponse, key: &str) -> Option<Uuid> {
    verified
        .metadata
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(metadata: serde_json::Value) -> VerifyResponse {
        VerifyResponse {
            status: "success".to_string(),
            reference: "PAY_1_abc".to_string(),
            amount_minor: 5_000_000,
            channel: Some("card".to_string()),
            paid_at: None,
            message: Some("Approved".to_string()),
            metadata,
            raw: json!({}),
        }
    }

    #[test]
    fn test_metadata_id_reads_string_uuid() {
        let id = Uuid::new_v4();
        let verified = response(json!({ "student_id": id.to_string() }));
        assert_eq!(metadata_id(&verified, "student_id"), Some(id));
        assert_eq!(metadata_id(&verified, "fee_id"), None);
    }

    #[test]
    fn test_metadata_id_ignores_garbage() {
        let verified = response(json!({ "student_id": 42 }));
        assert_eq!(metadata_id(&verified, "student_id"), None);

        let verified = response(serde_json::Value::Null);
        assert_eq!(metadata_id(&verified, "student_id"), None);
    }

    #[test]
    fn test_rejected_uses_gateway_message() {
        let mut verified = response(json!({}));
        verified.status = "abandoned".to_string();
        assert_eq!(rejected(&verified).status(), axum::http::StatusCode::BAD_REQUEST);

        verified.message = None;
        let error = rejected(&verified);
        assert!(error.app_error().to_string().contains("abandoned"));
    }
}
