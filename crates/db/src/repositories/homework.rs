//! Homework repository.

use chrono::NaiveDate;
use scholaris_core::planning::{PlanningError, check_due_date};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{Page, class_section, fetch_page, now};
use crate::entities::homeworks;

/// Error types for homework operations.
#[derive(Debug, thiserror::Error)]
pub enum HomeworkError {
    /// Homework not found in this school.
    #[error("Homework not found: {0}")]
    NotFound(Uuid),

    /// Class or subject does not belong to this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Only the teacher who set it, or school management, may change it.
    #[error("Only the teacher who set this homework may change it")]
    NotAuthor,

    /// Date rule.
    #[error(transparent)]
    Planning(#[from] PlanningError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for setting or replacing homework.
#[derive(Debug, Clone)]
pub struct HomeworkInput {
    /// Class.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Title.
    pub title: String,
    /// Instructions.
    pub description: Option<String>,
    /// Day the work is due.
    pub due_date: NaiveDate,
}

/// Filter options for listing homework.
#[derive(Debug, Clone, Default)]
pub struct HomeworkFilter {
    /// Class.
    pub class_id: Option<Uuid>,
    /// Subject.
    pub subject_id: Option<Uuid>,
    /// Teacher who set it.
    pub teacher_id: Option<Uuid>,
}

/// Homework repository.
#[derive(Debug, Clone)]
pub struct HomeworkRepository {
    db: DatabaseConnection,
}

impl HomeworkRepository {
    /// Creates a new homework repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists homework, latest due date first.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &HomeworkFilter,
        page: &PageRequest,
    ) -> Result<Page<homeworks::Model>, DbErr> {
        let mut query = homeworks::Entity::find()
            .filter(homeworks::Column::SchoolId.eq(school_id))
            .order_by_desc(homeworks::Column::DueDate)
            .order_by_desc(homeworks::Column::CreatedAt);
        if let Some(id) = filter.class_id {
            query = query.filter(homeworks::Column::ClassId.eq(id));
        }
        if let Some(id) = filter.subject_id {
            query = query.filter(homeworks::Column::SubjectId.eq(id));
        }
        if let Some(id) = filter.teacher_id {
            query = query.filter(homeworks::Column::TeacherId.eq(id));
        }
        fetch_page(&self.db, query, page).await
    }

    /// Finds homework of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<homeworks::Model>, DbErr> {
        homeworks::Entity::find_by_id(id)
            .filter(homeworks::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Sets homework today on behalf of `teacher_id`.
    pub async fn create(
        &self,
        school_id: Uuid,
        teacher_id: Uuid,
        input: HomeworkInput,
    ) -> Result<homeworks::Model, HomeworkError> {
        let timestamp = now();
        let assigned_on = timestamp.date_naive();
        check_due_date(assigned_on, input.due_date)?;
        class_section(&self.db, school_id, input.class_id, input.subject_id)
            .await?
            .map_err(HomeworkError::InvalidReference)?;

        let homework = homeworks::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            class_id: Set(input.class_id),
            subject_id: Set(input.subject_id),
            teacher_id: Set(teacher_id),
            title: Set(input.title),
            description: Set(input.description),
            assigned_on: Set(assigned_on),
            due_date: Set(input.due_date),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            school_id = %school_id,
            homework_id = %homework.id,
            class_id = %homework.class_id,
            "Homework set"
        );
        Ok(homework)
    }

    /// Replaces homework. The day it was set does not change.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        is_manager: bool,
        input: HomeworkInput,
    ) -> Result<homeworks::Model, HomeworkError> {
        let homework = self
            .find(school_id, id)
            .await?
            .ok_or(HomeworkError::NotFound(id))?;
        if !is_manager && homework.teacher_id != user_id {
            return Err(HomeworkError::NotAuthor);
        }
        check_due_date(homework.assigned_on, input.due_date)?;
        class_section(&self.db, school_id, input.class_id, input.subject_id)
            .await?
            .map_err(HomeworkError::InvalidReference)?;

        let mut active = homework.into_active_model();
        active.class_id = Set(input.class_id);
        active.subject_id = Set(input.subject_id);
        active.title = Set(input.title);
        active.description = Set(input.description);
        active.due_date = Set(input.due_date);
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes homework.
    pub async fn delete(
        &self,
        school_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        is_manager: bool,
    ) -> Result<(), HomeworkError> {
        let homework = self
            .find(school_id, id)
            .await?
            .ok_or(HomeworkError::NotFound(id))?;
        if !is_manager && homework.teacher_id != user_id {
            return Err(HomeworkError::NotAuthor);
        }
        homeworks::Entity::delete_by_id(homework.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
