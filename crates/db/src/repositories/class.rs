//! Class repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::now;
use crate::entities::{classes, sections, students};

/// Error types for class operations.
#[derive(Debug, thiserror::Error)]
pub enum ClassError {
    /// Class not found in this school.
    #[error("Class not found: {0}")]
    NotFound(Uuid),

    /// Section not found in this school.
    #[error("Section not found: {0}")]
    SectionNotFound(Uuid),

    /// Class still has enrolled students.
    #[error("Class {0} still has students")]
    HasStudents(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or replacing a class.
#[derive(Debug, Clone)]
pub struct ClassInput {
    /// Owning section.
    pub section_id: Uuid,
    /// Class name.
    pub class_name: String,
    /// Description.
    pub description: Option<String>,
    /// Form teacher.
    pub form_teacher_id: Option<Uuid>,
    /// Maximum number of students.
    pub capacity: Option<i32>,
    /// Active flag.
    pub is_active: bool,
}

/// Class repository.
#[derive(Debug, Clone)]
pub struct ClassRepository {
    db: DatabaseConnection,
}

impl ClassRepository {
    /// Creates a new class repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists classes of a school, optionally of one section.
    pub async fn list(
        &self,
        school_id: Uuid,
        section_id: Option<Uuid>,
    ) -> Result<Vec<classes::Model>, DbErr> {
        let mut query = classes::Entity::find()
            .filter(classes::Column::SchoolId.eq(school_id))
            .order_by_asc(classes::Column::ClassName);
        if let Some(section_id) = section_id {
            query = query.filter(classes::Column::SectionId.eq(section_id));
        }
        query.all(&self.db).await
    }

    /// Finds a class of the given school.
    pub async fn find(&self, school_id: Uuid, id: Uuid) -> Result<Option<classes::Model>, DbErr> {
        classes::Entity::find_by_id(id)
            .filter(classes::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Number of students in a class.
    pub async fn student_count(&self, id: Uuid) -> Result<u64, DbErr> {
        students::Entity::find()
            .filter(students::Column::ClassId.eq(id))
            .count(&self.db)
            .await
    }

    /// Creates a class.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: ClassInput,
    ) -> Result<classes::Model, ClassError> {
        self.require_section(school_id, input.section_id).await?;

        let timestamp = now();
        let class = classes::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(input.section_id),
            class_name: Set(input.class_name),
            description: Set(input.description),
            form_teacher_id: Set(input.form_teacher_id),
            capacity: Set(input.capacity),
            is_active: Set(input.is_active),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(school_id = %school_id, class_id = %class.id, "Class created");
        Ok(class)
    }

    /// Replaces the editable fields of a class.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: ClassInput,
    ) -> Result<classes::Model, ClassError> {
        let class = self
            .find(school_id, id)
            .await?
            .ok_or(ClassError::NotFound(id))?;
        self.require_section(school_id, input.section_id).await?;

        let mut active = class.into_active_model();
        active.section_id = Set(input.section_id);
        active.class_name = Set(input.class_name);
        active.description = Set(input.description);
        active.form_teacher_id = Set(input.form_teacher_id);
        active.capacity = Set(input.capacity);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an empty class.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), ClassError> {
        self.find(school_id, id)
            .await?
            .ok_or(ClassError::NotFound(id))?;
        if self.student_count(id).await? > 0 {
            return Err(ClassError::HasStudents(id));
        }

        classes::Entity::delete_by_id(id).exec(&self.db).await?;
        tracing::info!(school_id = %school_id, class_id = %id, "Class deleted");
        Ok(())
    }

    async fn require_section(&self, school_id: Uuid, section_id: Uuid) -> Result<(), ClassError> {
        sections::Entity::find_by_id(section_id)
            .filter(sections::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(ClassError::SectionNotFound(section_id))
    }
}
