//! Notification routes for the current user.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use scholaris_core::auth::UserRole;
use scholaris_db::{
    NewNotification, NotificationRepository, UserRepository, entities::notifications,
};
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::ValidatedJson,
    middleware::AuthUser,
};

/// Kind stored on broadcast notifications.
const BROADCAST_KIND: &str = "announcement";

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/broadcast", post(broadcast))
        .route("/notifications/{notification}", delete(delete_notification))
        .route("/notifications/{notification}/read", post(mark_read))
}

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Only unread notifications.
    #[serde(default)]
    pub unread: bool,
}

/// Request body for a broadcast.
#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    /// Recipients: every active user with this role.
    pub role: UserRole,
    /// Title.
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    /// Body.
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// A count of affected or matching notifications.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Count.
    pub count: u64,
}

/// GET /notifications - The caller's notifications.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<notifications::Model>>> {
    let rows = NotificationRepository::new(state.conn())
        .list(auth.user_id(), query.unread, &page)
        .await?;
    Ok(Json(rows.into()))
}

/// GET /notifications/unread-count
async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CountResponse>> {
    let count = NotificationRepository::new(state.conn())
        .unread_count(auth.user_id())
        .await?;
    Ok(Json(CountResponse { count }))
}

/// POST /notifications/{notification}/read
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    NotificationRepository::new(state.conn())
        .mark_read(auth.user_id(), notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notifications/read-all
async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CountResponse>> {
    let count = NotificationRepository::new(state.conn())
        .mark_all_read(auth.user_id())
        .await?;
    Ok(Json(CountResponse { count }))
}

/// DELETE /notifications/{notification}
async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    NotificationRepository::new(state.conn())
        .delete(auth.user_id(), notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notifications/broadcast - Notify every user of a role in the
/// caller's school.
async fn broadcast(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<BroadcastRequest>,
) -> ApiResult<Json<CountResponse>> {
    auth.require(UserRole::is_staff)?;
    let school_id = auth.school_id();

    let recipients = UserRepository::new(state.conn())
        .ids_with_role(school_id, payload.role.into())
        .await?;
    let batch = recipients
        .into_iter()
        .map(|user_id| NewNotification {
            user_id,
            kind: BROADCAST_KIND.to_string(),
            title: payload.title.clone(),
            message: payload.message.clone(),
            data: None,
        })
        .collect();

    let count = NotificationRepository::new(state.conn())
        .create_many(batch)
        .await?;
    info!(
        school_id = %school_id,
        role = %payload.role,
        count,
        "Broadcast delivered"
    );
    Ok(Json(CountResponse { count }))
}
