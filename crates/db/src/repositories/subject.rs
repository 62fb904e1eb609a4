//! Subject repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::now;
use crate::entities::{classes, sections, subjects};

/// Error types for subject operations.
#[derive(Debug, thiserror::Error)]
pub enum SubjectError {
    /// Subject not found in this school.
    #[error("Subject not found: {0}")]
    NotFound(Uuid),

    /// Section or class does not belong to this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or replacing a subject.
#[derive(Debug, Clone)]
pub struct SubjectInput {
    /// Owning section.
    pub section_id: Uuid,
    /// Class the subject is taught in, if restricted to one.
    pub class_id: Option<Uuid>,
    /// Subject name.
    pub name: String,
    /// Short code, e.g. "MTH".
    pub code: Option<String>,
}

/// Subject repository.
#[derive(Debug, Clone)]
pub struct SubjectRepository {
    db: DatabaseConnection,
}

impl SubjectRepository {
    /// Creates a new subject repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists subjects, optionally of one section or class.
    pub async fn list(
        &self,
        school_id: Uuid,
        section_id: Option<Uuid>,
        class_id: Option<Uuid>,
    ) -> Result<Vec<subjects::Model>, DbErr> {
        let mut query = subjects::Entity::find()
            .filter(subjects::Column::SchoolId.eq(school_id))
            .order_by_asc(subjects::Column::Name);
        if let Some(section_id) = section_id {
            query = query.filter(subjects::Column::SectionId.eq(section_id));
        }
        if let Some(class_id) = class_id {
            query = query.filter(subjects::Column::ClassId.eq(class_id));
        }
        query.all(&self.db).await
    }

    /// Finds a subject of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<subjects::Model>, DbErr> {
        subjects::Entity::find_by_id(id)
            .filter(subjects::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Creates a subject.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: SubjectInput,
    ) -> Result<subjects::Model, SubjectError> {
        self.check_references(school_id, &input).await?;

        let timestamp = now();
        let subject = subjects::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(input.section_id),
            class_id: Set(input.class_id),
            name: Set(input.name),
            code: Set(input.code),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(school_id = %school_id, subject_id = %subject.id, "Subject created");
        Ok(subject)
    }

    /// Replaces the editable fields of a subject.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: SubjectInput,
    ) -> Result<subjects::Model, SubjectError> {
        let subject = self
            .find(school_id, id)
            .await?
            .ok_or(SubjectError::NotFound(id))?;
        self.check_references(school_id, &input).await?;

        let mut active = subject.into_active_model();
        active.section_id = Set(input.section_id);
        active.class_id = Set(input.class_id);
        active.name = Set(input.name);
        active.code = Set(input.code);
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a subject.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), SubjectError> {
        let result = subjects::Entity::delete_many()
            .filter(subjects::Column::Id.eq(id))
            .filter(subjects::Column::SchoolId.eq(school_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SubjectError::NotFound(id));
        }
        Ok(())
    }

    async fn check_references(
        &self,
        school_id: Uuid,
        input: &SubjectInput,
    ) -> Result<(), SubjectError> {
        let section = sections::Entity::find_by_id(input.section_id)
            .filter(sections::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await?;
        if section.is_none() {
            return Err(SubjectError::InvalidReference(format!(
                "section {}",
                input.section_id
            )));
        }

        if let Some(class_id) = input.class_id {
            let class = classes::Entity::find_by_id(class_id)
                .filter(classes::Column::SchoolId.eq(school_id))
                .one(&self.db)
                .await?;
            if class.is_none_or(|c| c.section_id != input.section_id) {
                return Err(SubjectError::InvalidReference(format!("class {class_id}")));
            }
        }
        Ok(())
    }
}
