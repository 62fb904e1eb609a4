//! Direct messages between users of one school.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{Page, fetch_page, now};
use crate::entities::{messages, users};

/// Error types for message operations.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Message not found for this user.
    #[error("Message not found: {0}")]
    NotFound(Uuid),

    /// Recipient is not a user of this school.
    #[error("Recipient not found: {0}")]
    RecipientNotFound(Uuid),

    /// Sender and recipient are the same user.
    #[error("Cannot send a message to yourself")]
    SelfMessage,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for sending a message.
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    /// Recipient user.
    pub recipient_id: Uuid,
    /// Subject line.
    pub subject: Option<String>,
    /// Body.
    pub body: String,
}

/// Message repository.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    db: DatabaseConnection,
}

impl MessageRepository {
    /// Creates a new message repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Sends a message to another user of the same school.
    pub async fn send(
        &self,
        school_id: Uuid,
        sender_id: Uuid,
        input: SendMessageInput,
    ) -> Result<messages::Model, MessageError> {
        if input.recipient_id == sender_id {
            return Err(MessageError::SelfMessage);
        }
        let recipient = users::Entity::find_by_id(input.recipient_id)
            .filter(users::Column::SchoolId.eq(school_id))
            .filter(users::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        if recipient == 0 {
            return Err(MessageError::RecipientNotFound(input.recipient_id));
        }

        let timestamp = now();
        let message = messages::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            sender_id: Set(sender_id),
            recipient_id: Set(input.recipient_id),
            subject: Set(input.subject),
            body: Set(input.body),
            read_at: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(school_id = %school_id, message_id = %message.id, "Message sent");
        Ok(message)
    }

    /// Messages received by the user, newest first.
    pub async fn inbox(
        &self,
        school_id: Uuid,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<Page<messages::Model>, DbErr> {
        let query = messages::Entity::find()
            .filter(messages::Column::SchoolId.eq(school_id))
            .filter(messages::Column::RecipientId.eq(user_id))
            .order_by_desc(messages::Column::CreatedAt);
        fetch_page(&self.db, query, page).await
    }

    /// Messages sent by the user, newest first.
    pub async fn sent(
        &self,
        school_id: Uuid,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<Page<messages::Model>, DbErr> {
        let query = messages::Entity::find()
            .filter(messages::Column::SchoolId.eq(school_id))
            .filter(messages::Column::SenderId.eq(user_id))
            .order_by_desc(messages::Column::CreatedAt);
        fetch_page(&self.db, query, page).await
    }

    /// Both directions of a conversation, oldest first.
    pub async fn conversation(
        &self,
        school_id: Uuid,
        user_id: Uuid,
        other_id: Uuid,
        page: &PageRequest,
    ) -> Result<Page<messages::Model>, DbErr> {
        let query = messages::Entity::find()
            .filter(messages::Column::SchoolId.eq(school_id))
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(messages::Column::SenderId.eq(user_id))
                            .add(messages::Column::RecipientId.eq(other_id)),
                    )
                    .add(
                        Condition::all()
                            .add(messages::Column::SenderId.eq(other_id))
                            .add(messages::Column::RecipientId.eq(user_id)),
                    ),
            )
            .order_by_asc(messages::Column::CreatedAt);
        fetch_page(&self.db, query, page).await
    }

    /// Number of unread received messages.
    pub async fn unread_count(&self, school_id: Uuid, user_id: Uuid) -> Result<u64, DbErr> {
        messages::Entity::find()
            .filter(messages::Column::SchoolId.eq(school_id))
            .filter(messages::Column::RecipientId.eq(user_id))
            .filter(messages::Column::ReadAt.is_null())
            .count(&self.db)
            .await
    }

    /// Marks a received message read.
    pub async fn mark_read(
        &self,
        school_id: Uuid,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), MessageError> {
        let found = messages::Entity::find_by_id(id)
            .filter(messages::Column::SchoolId.eq(school_id))
            .filter(messages::Column::RecipientId.eq(user_id))
            .count(&self.db)
            .await?;
        if found == 0 {
            return Err(MessageError::NotFound(id));
        }

        let timestamp = now();
        messages::Entity::update_many()
            .col_expr(messages::Column::ReadAt, Expr::value(timestamp))
            .col_expr(messages::Column::UpdatedAt, Expr::value(timestamp))
            .filter(messages::Column::Id.eq(id))
            .filter(messages::Column::ReadAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Deletes a message the user sent.
    pub async fn delete(
        &self,
        school_id: Uuid,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), MessageError> {
        let result = messages::Entity::delete_many()
            .filter(messages::Column::Id.eq(id))
            .filter(messages::Column::SchoolId.eq(school_id))
            .filter(messages::Column::SenderId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(MessageError::NotFound(id));
        }
        Ok(())
    }
}
