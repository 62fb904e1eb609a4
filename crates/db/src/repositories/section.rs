//! Section repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::now;
use crate::entities::{classes, section_students, sections};

/// Error types for section operations.
#[derive(Debug, thiserror::Error)]
pub enum SectionError {
    /// Section not found in this school.
    #[error("Section not found: {0}")]
    NotFound(Uuid),

    /// Section still has classes.
    #[error("Section {0} still has classes")]
    HasClasses(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or replacing a section.
#[derive(Debug, Clone)]
pub struct SectionInput {
    /// Section name.
    pub section_name: String,
    /// Description.
    pub description: Option<String>,
    /// Active flag.
    pub is_active: bool,
}

/// Section repository.
#[derive(Debug, Clone)]
pub struct SectionRepository {
    db: DatabaseConnection,
}

impl SectionRepository {
    /// Creates a new section repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the sections of a school.
    pub async fn list(&self, school_id: Uuid) -> Result<Vec<sections::Model>, DbErr> {
        sections::Entity::find()
            .filter(sections::Column::SchoolId.eq(school_id))
            .order_by_asc(sections::Column::SectionName)
            .all(&self.db)
            .await
    }

    /// Finds a section of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<sections::Model>, DbErr> {
        sections::Entity::find_by_id(id)
            .filter(sections::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Creates a section.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: SectionInput,
    ) -> Result<sections::Model, SectionError> {
        let timestamp = now();
        let section = sections::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_name: Set(input.section_name),
            description: Set(input.description),
            is_active: Set(input.is_active),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(school_id = %school_id, section_id = %section.id, "Section created");
        Ok(section)
    }

    /// Replaces the editable fields of a section.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: SectionInput,
    ) -> Result<sections::Model, SectionError> {
        let section = self
            .find(school_id, id)
            .await?
            .ok_or(SectionError::NotFound(id))?;

        let mut active = section.into_active_model();
        active.section_name = Set(input.section_name);
        active.description = Set(input.description);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a section with no classes, dropping its student memberships.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), SectionError> {
        self.find(school_id, id)
            .await?
            .ok_or(SectionError::NotFound(id))?;

        let class_count = classes::Entity::find()
            .filter(classes::Column::SectionId.eq(id))
            .count(&self.db)
            .await?;
        if class_count > 0 {
            return Err(SectionError::HasClasses(id));
        }

        section_students::Entity::delete_many()
            .filter(section_students::Column::SectionId.eq(id))
            .exec(&self.db)
            .await?;
        sections::Entity::delete_by_id(id).exec(&self.db).await?;

        tracing::info!(school_id = %school_id, section_id = %id, "Section deleted");
        Ok(())
    }
}
