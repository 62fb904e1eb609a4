//! Staff and parent account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use scholaris_core::auth::{UserRole, hash_password};
use scholaris_db::{CreateUserInput, UpdateUserInput, UserFilter, UserRepository};
use scholaris_shared::auth::UserInfo;
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::auth::user_info;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/users", get(list_users).post(create_user))
        .route(
            "/schools/{school}/users/{user}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Filter by role.
    pub role: Option<UserRole>,
    /// Matches name, email or registration ID.
    pub search: Option<String>,
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Login email.
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    /// Initial password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Full name.
    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,
    /// Phone.
    pub phone: Option<String>,
    /// Role in the school.
    pub role: UserRole,
}

/// Request body for updating a user. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// Full name.
    #[validate(length(min = 1, max = 255, message = "Full name must not be empty"))]
    pub full_name: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// New password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// GET `/schools/{school}/users` - List accounts.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<ListUsersQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<UserInfo>>> {
    auth.require(UserRole::is_staff)?;

    let filter = UserFilter {
        role: query.role.map(Into::into),
        search: query.search,
    };
    let users = UserRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;

    Ok(Json(users.map(|u| user_info(&u)).into()))
}

/// POST `/schools/{school}/users` - Create an account with a registration ID.
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserInfo>)> {
    let caller = auth.require(UserRole::can_manage_school)?;
    if payload.role == UserRole::Admin && caller != UserRole::Admin {
        return Err(ApiError::forbidden("Only administrators can create administrators."));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = UserRepository::new(state.conn())
        .create(CreateUserInput {
            school_id,
            email: payload.email.trim().to_lowercase(),
            password_hash,
            full_name: payload.full_name.trim().to_string(),
            phone: payload.phone,
            role: payload.role.into(),
        })
        .await?;

    info!(
        school_id = %school_id,
        user_id = %user.id,
        created_by = %auth.user_id(),
        "User created"
    );
    Ok((StatusCode::CREATED, Json(user_info(&user))))
}

/// GET `/schools/{school}/users/{user}` - Show an account.
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<UserInfo>> {
    if user_id != auth.user_id() {
        auth.require(UserRole::is_staff)?;
    }

    UserRepository::new(state.conn())
        .find_in_school(school_id, user_id)
        .await?
        .map(|u| Json(user_info(&u)))
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// PUT `/schools/{school}/users/{user}` - Update an account.
///
/// Users may edit their own profile; only managers may change others or
/// toggle the active flag.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserInfo>> {
    if user_id != auth.user_id() || payload.is_active.is_some() {
        auth.require(UserRole::can_manage_school)?;
    }

    let password_hash = payload.password.as_deref().map(hash_password).transpose()?;
    let user = UserRepository::new(state.conn())
        .update(
            school_id,
            user_id,
            UpdateUserInput {
                full_name: payload.full_name,
                phone: payload.phone.map(Some),
                password_hash,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(Json(user_info(&user)))
}

/// DELETE `/schools/{school}/users/{user}` - Remove an account.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    if user_id == auth.user_id() {
        return Err(ApiError::new(scholaris_shared::AppError::BusinessRule(
            "You cannot delete your own account.".to_string(),
        )));
    }

    UserRepository::new(state.conn())
        .delete(school_id, user_id)
        .await?;

    info!(school_id = %school_id, user_id = %user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
