//! Syllabus repository: topics per class and subject with coverage status.

use chrono::NaiveDate;
use scholaris_core::planning::SyllabusStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{Page, class_section, fetch_page, now};
use crate::entities::{sea_orm_active_enums, syllabuses};

/// Error types for syllabus operations.
#[derive(Debug, thiserror::Error)]
pub enum SyllabusError {
    /// Topic not found in this school.
    #[error("Syllabus topic not found: {0}")]
    NotFound(Uuid),

    /// Class or subject does not belong to this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or replacing a syllabus topic.
#[derive(Debug, Clone)]
pub struct SyllabusInput {
    /// Class.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Topic title.
    pub topic: String,
    /// What the topic covers.
    pub description: Option<String>,
    /// Coverage.
    pub status: SyllabusStatus,
    /// Day the topic was finished. Ignored unless completed.
    pub completion_date: Option<NaiveDate>,
}

/// Filter options for listing syllabus topics.
#[derive(Debug, Clone, Default)]
pub struct SyllabusFilter {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Subject.
    pub subject_id: Option<Uuid>,
    /// Coverage.
    pub status: Option<SyllabusStatus>,
}

/// Syllabus repository.
#[derive(Debug, Clone)]
pub struct SyllabusRepository {
    db: DatabaseConnection,
}

impl SyllabusRepository {
    /// Creates a new syllabus repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists topics in the order they were added.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &SyllabusFilter,
        page: &PageRequest,
    ) -> Result<Page<syllabuses::Model>, DbErr> {
        let mut query = syllabuses::Entity::find()
            .filter(syllabuses::Column::SchoolId.eq(school_id))
            .order_by_asc(syllabuses::Column::CreatedAt);
        if let Some(id) = filter.section_id {
            query = query.filter(syllabuses::Column::SectionId.eq(id));
        }
        if let Some(id) = filter.class_id {
            query = query.filter(syllabuses::Column::ClassId.eq(id));
        }
        if let Some(id) = filter.subject_id {
            query = query.filter(syllabuses::Column::SubjectId.eq(id));
        }
        if let Some(status) = filter.status {
            let status = sea_orm_active_enums::SyllabusStatus::from(status);
            query = query.filter(syllabuses::Column::Status.eq(status));
        }
        fetch_page(&self.db, query, page).await
    }

    /// Finds a topic of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<syllabuses::Model>, DbErr> {
        syllabuses::Entity::find_by_id(id)
            .filter(syllabuses::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Creates a topic.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: SyllabusInput,
    ) -> Result<syllabuses::Model, SyllabusError> {
        let section_id = class_section(&self.db, school_id, input.class_id, input.subject_id)
            .await?
            .map_err(SyllabusError::InvalidReference)?;

        let timestamp = now();
        let completion_date = input
            .status
            .completion_date(input.completion_date, timestamp.date_naive());
        let topic = syllabuses::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(section_id),
            class_id: Set(input.class_id),
            subject_id: Set(input.subject_id),
            topic: Set(input.topic),
            description: Set(input.description),
            status: Set(input.status.into()),
            completion_date: Set(completion_date),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(school_id = %school_id, syllabus_id = %topic.id, "Syllabus topic created");
        Ok(topic)
    }

    /// Replaces a topic. A completed topic without a date is stamped today.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: SyllabusInput,
    ) -> Result<syllabuses::Model, SyllabusError> {
        let topic = self
            .find(school_id, id)
            .await?
            .ok_or(SyllabusError::NotFound(id))?;
        let section_id = class_section(&self.db, school_id, input.class_id, input.subject_id)
            .await?
            .map_err(SyllabusError::InvalidReference)?;

        let timestamp = now();
        let requested = input.completion_date.or(topic.completion_date);
        let completion_date = input.status.completion_date(requested, timestamp.date_naive());

        let mut active = topic.into_active_model();
        active.section_id = Set(section_id);
        active.class_id = Set(input.class_id);
        active.subject_id = Set(input.subject_id);
        active.topic = Set(input.topic);
        active.description = Set(input.description);
        active.status = Set(input.status.into());
        active.completion_date = Set(completion_date);
        active.updated_at = Set(timestamp);

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a topic.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), SyllabusError> {
        let result = syllabuses::Entity::delete_many()
            .filter(syllabuses::Column::Id.eq(id))
            .filter(syllabuses::Column::SchoolId.eq(school_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SyllabusError::NotFound(id));
        }
        Ok(())
    }
}
