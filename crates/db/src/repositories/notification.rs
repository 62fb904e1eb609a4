//! Notification repository.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, prelude::Json, sea_query::Expr,
};
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{Page, fetch_page, now};
use crate::entities::notifications;

/// Error types for notification operations.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Notification not found for this user.
    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A notification to be delivered.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: Uuid,
    /// Machine-readable kind, e.g. `exam_result_published`.
    pub kind: String,
    /// Title.
    pub title: String,
    /// Body.
    pub message: String,
    /// Extra payload.
    pub data: Option<Json>,
}

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<Page<notifications::Model>, DbErr> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt);
        if unread_only {
            query = query.filter(notifications::Column::ReadAt.is_null());
        }
        fetch_page(&self.db, query, page).await
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_null())
            .count(&self.db)
            .await
    }

    /// Delivers notifications.
    pub async fn create_many(&self, batch: Vec<NewNotification>) -> Result<u64, DbErr> {
        insert_many(&self.db, batch).await
    }

    /// Marks one notification read.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<(), NotificationError> {
        let found = notifications::Entity::find_by_id(id)
            .filter(notifications::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        if found == 0 {
            return Err(NotificationError::NotFound(id));
        }

        notifications::Entity::update_many()
            .col_expr(notifications::Column::ReadAt, Expr::value(now()))
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Marks all of a user's notifications read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::ReadAt, Expr::value(now()))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Deletes one of the user's notifications.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), NotificationError> {
        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(NotificationError::NotFound(id));
        }
        Ok(())
    }
}

pub(crate) async fn insert_many<C: ConnectionTrait>(
    conn: &C,
    batch: Vec<NewNotification>,
) -> Result<u64, DbErr> {
    if batch.is_empty() {
        return Ok(0);
    }
    let timestamp = now();
    notifications::Entity::insert_many(batch.into_iter().map(|n| notifications::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(n.user_id),
        kind: Set(n.kind),
        title: Set(n.title),
        message: Set(n.message),
        data: Set(n.data),
        read_at: Set(None),
        created_at: Set(timestamp),
    }))
    .exec_without_returning(conn)
    .await
}
