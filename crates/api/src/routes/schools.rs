//! School settings routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use rust_decimal::Decimal;
use scholaris_core::auth::UserRole;
use scholaris_core::registration::normalize_short_code;
use scholaris_db::{SchoolRepository, UpdateSchoolInput, entities::schools};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the school routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/schools/{school}", get(get_school).put(update_school))
}

/// Request body for updating a school. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSchoolRequest {
    /// School name.
    #[validate(length(min = 1, max = 255, message = "School name must not be empty"))]
    pub name: Option<String>,
    /// New short code; renames every issued registration ID.
    pub short_code: Option<String>,
    /// Address.
    pub address: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Contact email.
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    /// Logo URL.
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
    /// Gateway subaccount code for split settlement.
    pub paystack_subaccount_code: Option<String>,
    /// Platform fee percentage, 0 to 100.
    pub platform_fee_percentage: Option<Decimal>,
    /// Settlement bank.
    pub settlement_bank: Option<String>,
    /// Settlement account number.
    pub account_number: Option<String>,
}

/// Response for a school update.
#[derive(Debug, Serialize)]
pub struct UpdateSchoolResponse {
    /// Updated school.
    pub school: schools::Model,
    /// Registration IDs and admission numbers rewritten by a short-code change.
    pub renamed_ids: u64,
}

/// GET `/schools/{school}` - School details.
async fn get_school(
    State(state): State<AppState>,
    Path(school_id): Path<Uuid>,
) -> ApiResult<Json<schools::Model>> {
    SchoolRepository::new(state.conn())
        .find_by_id(school_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("School not found"))
}

/// PUT `/schools/{school}` - Update school settings.
async fn update_school(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSchoolRequest>,
) -> ApiResult<Json<UpdateSchoolResponse>> {
    auth.require(UserRole::can_manage_school)?;

    if let Some(pct) = payload.platform_fee_percentage
        && !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&pct)
    {
        return Err(ApiError::field(
            "platform_fee_percentage",
            "Platform fee percentage must be between 0 and 100",
        ));
    }
    let short_code = payload
        .short_code
        .as_deref()
        .map(normalize_short_code)
        .transpose()?;

    let update = SchoolRepository::new(state.conn())
        .update(
            school_id,
            UpdateSchoolInput {
                name: payload.name,
                short_code,
                address: payload.address.map(Some),
                phone: payload.phone.map(Some),
                email: payload.email.map(Some),
                logo_url: payload.logo_url.map(Some),
                paystack_subaccount_code: payload.paystack_subaccount_code.map(Some),
                platform_fee_percentage: payload.platform_fee_percentage.map(Some),
                settlement_bank: payload.settlement_bank.map(Some),
                account_number: payload.account_number.map(Some),
            },
        )
        .await?;

    Ok(Json(UpdateSchoolResponse {
        school: update.school,
        renamed_ids: update.renamed_ids,
    }))
}
