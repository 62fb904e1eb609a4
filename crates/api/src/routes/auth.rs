//! Authentication routes: login, current user and school onboarding.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use scholaris_core::auth::{UserRole, hash_password, verify_password};
use scholaris_core::registration::normalize_short_code;
use scholaris_db::{
    OnboardSchoolInput, SchoolRepository, UserRepository,
    entities::{schools, users},
};
use scholaris_shared::auth::{LoginRequest, LoginResponse, UserInfo};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/onboard-school", post(onboard_school))
}

/// Auth routes that need a token.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Request body for onboarding a school.
#[derive(Debug, Deserialize, Validate)]
pub struct OnboardSchoolRequest {
    /// School name.
    #[validate(length(min = 1, max = 255, message = "School name is required"))]
    pub school_name: String,
    /// Short code used in registration IDs, e.g. `AIA`.
    pub short_code: String,
    /// School address.
    pub address: Option<String>,
    /// School phone.
    pub phone: Option<String>,
    /// School contact email.
    #[validate(email(message = "School email must be a valid email address"))]
    pub email: Option<String>,
    /// Proprietor's full name.
    #[validate(length(min = 1, max = 255, message = "Owner name is required"))]
    pub owner_name: String,
    /// Proprietor's login email.
    #[validate(email(message = "Owner email must be a valid email address"))]
    pub owner_email: String,
    /// Proprietor's password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Onboarding response: the new school and a session for its proprietor.
#[derive(Debug, Serialize)]
pub struct OnboardSchoolResponse {
    /// Created school.
    pub school: schools::Model,
    /// Proprietor session.
    #[serde(flatten)]
    pub login: LoginResponse,
}

/// Current user with their school.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// User.
    pub user: UserInfo,
    /// School the user belongs to.
    pub school: schools::Model,
}

/// Builds the public view of a user.
pub(crate) fn user_info(user: &users::Model) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: UserRole::from(user.role).to_string(),
        school_id: user.school_id,
        registration_id: user.registration_id.clone(),
    }
}

fn issue_session(state: &AppState, user: &users::Model) -> ApiResult<LoginResponse> {
    let role = UserRole::from(user.role);
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, user.school_id, role.as_str())?;

    Ok(LoginResponse {
        user: user_info(user),
        access_token,
        token_type: "Bearer",
        expires_in: state.jwt_service.access_token_expires_in(),
    })
}

/// POST /auth/login - Authenticate user and return a token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::field("email", "Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::field("password", "Password is required"));
    }

    let user_repo = UserRepository::new(state.conn());
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let email = payload.email.trim().to_lowercase();
    let Some(user) = user_repo.find_by_email(&email).await? else {
        info!(email = %email, "Login attempt for non-existent user");
        return Err(invalid());
    };

    if !user.is_active {
        return Err(ApiError::unauthorized("This account has been disabled"));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid());
    }

    let response = issue_session(&state, &user)?;
    info!(user_id = %user.id, school_id = %user.school_id, "User logged in successfully");
    Ok(Json(response))
}

/// GET /auth/me - Current user.
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MeResponse>> {
    let user = UserRepository::new(state.conn())
        .find_in_school(auth.school_id(), auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let school = SchoolRepository::new(state.conn())
        .find_by_id(user.school_id)
        .await?
        .ok_or_else(|| ApiError::not_found("School not found"))?;

    Ok(Json(MeResponse {
        user: user_info(&user),
        school,
    }))
}

/// POST /auth/onboard-school - Create a school with its proprietor.
async fn onboard_school(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<OnboardSchoolRequest>,
) -> ApiResult<(StatusCode, Json<OnboardSchoolResponse>)> {
    let short_code = normalize_short_code(&payload.short_code)?;
    let owner_password_hash = hash_password(&payload.password)?;

    let (school, owner) = SchoolRepository::new(state.conn())
        .onboard(OnboardSchoolInput {
            name: payload.school_name.trim().to_string(),
            short_code,
            address: payload.address,
            phone: payload.phone,
            email: payload.email,
            owner_name: payload.owner_name.trim().to_string(),
            owner_email: payload.owner_email.trim().to_lowercase(),
            owner_password_hash,
        })
        .await?;

    let login = issue_session(&state, &owner)?;
    Ok((StatusCode::CREATED, Json(OnboardSchoolResponse { school, login })))
}
