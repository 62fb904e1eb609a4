//! Direct messages between users of the caller's school.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use scholaris_db::{MessageRepository, SendMessageInput, entities::messages};
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::notifications::CountResponse;
use crate::{AppState, error::ApiResult, extractors::ValidatedJson, middleware::AuthUser};

/// Creates the message routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/inbox", get(inbox))
        .route("/messages/sent", get(sent))
        .route("/messages/unread-count", get(unread_count))
        .route("/messages/conversation/{user}", get(conversation))
        .route("/messages/{message}", delete(delete_message))
        .route("/messages/{message}/read", post(mark_read))
}

/// Request body for sending a message.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Recipient.
    pub recipient_id: Uuid,
    /// Subject line.
    #[validate(length(max = 255, message = "Subject must be at most 255 characters"))]
    pub subject: Option<String>,
    /// Body.
    #[validate(length(min = 1, max = 5000, message = "Message body is required"))]
    pub body: String,
}

/// POST /messages - Send a message.
async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<messages::Model>)> {
    let message = MessageRepository::new(state.conn())
        .send(
            auth.school_id(),
            auth.user_id(),
            SendMessageInput {
                recipient_id: payload.recipient_id,
                subject: payload.subject,
                body: payload.body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /messages/inbox
async fn inbox(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<messages::Model>>> {
    let rows = MessageRepository::new(state.conn())
        .inbox(auth.school_id(), auth.user_id(), &page)
        .await?;
    Ok(Json(rows.into()))
}

/// GET /messages/sent
async fn sent(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<messages::Model>>> {
    let rows = MessageRepository::new(state.conn())
        .sent(auth.school_id(), auth.user_id(), &page)
        .await?;
    Ok(Json(rows.into()))
}

/// GET /messages/conversation/{user} - Both directions, oldest first.
async fn conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(other_id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<messages::Model>>> {
    let rows = MessageRepository::new(state.conn())
        .conversation(auth.school_id(), auth.user_id(), other_id, &page)
        .await?;
    Ok(Json(rows.into()))
}

/// GET /messages/unread-count
async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CountResponse>> {
    let count = MessageRepository::new(state.conn())
        .unread_count(auth.school_id(), auth.user_id())
        .await?;
    Ok(Json(CountResponse { count }))
}

/// POST /messages/{message}/read
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    MessageRepository::new(state.conn())
        .mark_read(auth.school_id(), auth.user_id(), message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /messages/{message} - Delete a message the caller sent.
async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    MessageRepository::new(state.conn())
        .delete(auth.school_id(), auth.user_id(), message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
