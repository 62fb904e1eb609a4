//! Lesson plan repository.

use scholaris_core::planning::{LessonPlanStatus, PlanActor, PlanningError};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{Page, class_section, fetch_page, now};
use crate::entities::{lesson_plans, sea_orm_active_enums};

/// Error types for lesson plan operations.
#[derive(Debug, thiserror::Error)]
pub enum LessonPlanError {
    /// Lesson plan not found in this school.
    #[error("Lesson plan not found: {0}")]
    NotFound(Uuid),

    /// Class or subject does not belong to this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Only the plan's author may do this.
    #[error("Only the author may change this lesson plan")]
    NotAuthor,

    /// Workflow rule.
    #[error(transparent)]
    Planning(#[from] PlanningError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for writing or reworking a lesson plan.
#[derive(Debug, Clone)]
pub struct LessonPlanInput {
    /// Class taught.
    pub class_id: Uuid,
    /// Subject taught.
    pub subject_id: Uuid,
    /// Title.
    pub title: String,
    /// Plan body.
    pub content: String,
    /// Week of term the plan covers.
    pub week_number: i32,
    /// `draft` to keep working, `submitted` to ask for review.
    pub status: LessonPlanStatus,
}

/// A reviewer's decision.
#[derive(Debug, Clone)]
pub struct LessonPlanReview {
    /// `approved` or `rejected`.
    pub status: LessonPlanStatus,
    /// Feedback for the author. Required when rejecting.
    pub remarks: Option<String>,
}

/// Filter options for listing lesson plans.
#[derive(Debug, Clone, Default)]
pub struct LessonPlanFilter {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Author.
    pub teacher_id: Option<Uuid>,
    /// Status.
    pub status: Option<LessonPlanStatus>,
}

/// Lesson plan repository.
#[derive(Debug, Clone)]
pub struct LessonPlanRepository {
    db: DatabaseConnection,
}

impl LessonPlanRepository {
    /// Creates a new lesson plan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists lesson plans, latest week first.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &LessonPlanFilter,
        page: &PageRequest,
    ) -> Result<Page<lesson_plans::Model>, DbErr> {
        let mut query = lesson_plans::Entity::find()
            .filter(lesson_plans::Column::SchoolId.eq(school_id))
            .order_by_desc(lesson_plans::Column::WeekNumber)
            .order_by_desc(lesson_plans::Column::CreatedAt);
        if let Some(id) = filter.section_id {
            query = query.filter(lesson_plans::Column::SectionId.eq(id));
        }
        if let Some(id) = filter.class_id {
            query = query.filter(lesson_plans::Column::ClassId.eq(id));
        }
        if let Some(id) = filter.teacher_id {
            query = query.filter(lesson_plans::Column::TeacherId.eq(id));
        }
        if let Some(status) = filter.status {
            let status = sea_orm_active_enums::LessonPlanStatus::from(status);
            query = query.filter(lesson_plans::Column::Status.eq(status));
        }
        fetch_page(&self.db, query, page).await
    }

    /// Finds a lesson plan of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<lesson_plans::Model>, DbErr> {
        lesson_plans::Entity::find_by_id(id)
            .filter(lesson_plans::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Creates a lesson plan written by `teacher_id`.
    ///
    /// New plans start as `draft` or go straight to `submitted`.
    pub async fn create(
        &self,
        school_id: Uuid,
        teacher_id: Uuid,
        input: LessonPlanInput,
    ) -> Result<lesson_plans::Model, LessonPlanError> {
        let author = PlanActor {
            is_author: true,
            is_reviewer: false,
        };
        let status = LessonPlanStatus::Draft.transition(input.status, author)?;
        let section_id = class_section(&self.db, school_id, input.class_id, input.subject_id)
            .await?
            .map_err(LessonPlanError::InvalidReference)?;

        let timestamp = now();
        let plan = lesson_plans::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(section_id),
            class_id: Set(input.class_id),
            subject_id: Set(input.subject_id),
            teacher_id: Set(teacher_id),
            title: Set(input.title),
            content: Set(input.content),
            week_number: Set(input.week_number),
            status: Set(status.into()),
            remarks: Set(None),
            reviewed_by: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            school_id = %school_id,
            lesson_plan_id = %plan.id,
            status = %status,
            "Lesson plan created"
        );
        Ok(plan)
    }

    /// Replaces the content of a plan and moves it between `draft` and
    /// `submitted`. Only the author may do this, and not once approved.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: LessonPlanInput,
    ) -> Result<lesson_plans::Model, LessonPlanError> {
        let plan = self
            .find(school_id, id)
            .await?
            .ok_or(LessonPlanError::NotFound(id))?;
        if plan.teacher_id != user_id {
            return Err(LessonPlanError::NotAuthor);
        }
        let current: LessonPlanStatus = plan.status.into();
        let author = PlanActor {
            is_author: true,
            is_reviewer: false,
        };
        let status = current.transition(input.status, author)?;
        let section_id = class_section(&self.db, school_id, input.class_id, input.subject_id)
            .await?
            .map_err(LessonPlanError::InvalidReference)?;

        let mut active = plan.into_active_model();
        active.section_id = Set(section_id);
        active.class_id = Set(input.class_id);
        active.subject_id = Set(input.subject_id);
        active.title = Set(input.title);
        active.content = Set(input.content);
        active.week_number = Set(input.week_number);
        active.status = Set(status.into());
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Records a reviewer's decision on a submitted plan.
    pub async fn review(
        &self,
        school_id: Uuid,
        id: Uuid,
        reviewer_id: Uuid,
        review: LessonPlanReview,
    ) -> Result<lesson_plans::Model, LessonPlanError> {
        let plan = self
            .find(school_id, id)
            .await?
            .ok_or(LessonPlanError::NotFound(id))?;
        let current: LessonPlanStatus = plan.status.into();
        let reviewer = PlanActor {
            is_author: plan.teacher_id == reviewer_id,
            is_reviewer: true,
        };
        review.status.check_remarks(review.remarks.as_deref())?;
        let status = current.transition(review.status, reviewer)?;

        let mut active = plan.into_active_model();
        active.status = Set(status.into());
        active.remarks = Set(review.remarks);
        active.reviewed_by = Set(Some(reviewer_id));
        active.updated_at = Set(now());
        let plan = active.update(&self.db).await?;

        tracing::info!(
            school_id = %school_id,
            lesson_plan_id = %plan.id,
            reviewer_id = %reviewer_id,
            status = %status,
            "Lesson plan reviewed"
        );
        Ok(plan)
    }

    /// Deletes a plan. Authors may delete their own plans until approved;
    /// reviewers may delete any plan.
    pub async fn delete(
        &self,
        school_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        is_reviewer: bool,
    ) -> Result<(), LessonPlanError> {
        let plan = self
            .find(school_id, id)
            .await?
            .ok_or(LessonPlanError::NotFound(id))?;
        if !is_reviewer {
            if plan.teacher_id != user_id {
                return Err(LessonPlanError::NotAuthor);
            }
            if !LessonPlanStatus::from(plan.status).is_editable() {
                return Err(PlanningError::Locked.into());
            }
        }

        lesson_plans::Entity::delete_by_id(plan.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
