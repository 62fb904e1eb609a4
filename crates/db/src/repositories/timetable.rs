//! Timetable repository.
//!
//! A class cannot have two lessons at once and a teacher cannot be in two
//! places at once. Writes lock the school row so concurrent clash checks run
//! one after another.

use chrono::NaiveTime;
use scholaris_core::auth::UserRole;
use scholaris_core::planning::{Clash, PlanningError, ScheduledSlot, TimeSlot, Weekday};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use scholaris_shared::types::{ClassId, UserId};
use uuid::Uuid;

use super::common::{class_section, lock_school, now};
use crate::entities::{sea_orm_active_enums, timetables, users};

/// Error types for timetable operations.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// Entry not found in this school.
    #[error("Timetable entry not found: {0}")]
    NotFound(Uuid),

    /// A referenced row is not part of this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The class already has a lesson in that period.
    #[error("The class already has a lesson at that time (entry {0})")]
    ClassBusy(Uuid),

    /// The teacher is already teaching in that period.
    #[error("The teacher is already teaching at that time (entry {0})")]
    TeacherBusy(Uuid),

    /// Slot rule.
    #[error(transparent)]
    Planning(#[from] PlanningError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<Clash> for TimetableError {
    fn from(clash: Clash) -> Self {
        match clash {
            Clash::Class(id) => Self::ClassBusy(id),
            Clash::Teacher(id) => Self::TeacherBusy(id),
        }
    }
}

/// Input for creating or replacing a timetable entry.
#[derive(Debug, Clone)]
pub struct TimetableInput {
    /// Class.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Teacher teaching the lesson.
    pub teacher_id: Uuid,
    /// Day of the week.
    pub day: Weekday,
    /// Start of the period.
    pub start_time: NaiveTime,
    /// End of the period.
    pub end_time: NaiveTime,
}

/// Filter options for listing timetable entries.
#[derive(Debug, Clone, Default)]
pub struct TimetableFilter {
    /// Class.
    pub class_id: Option<Uuid>,
    /// Teacher.
    pub teacher_id: Option<Uuid>,
    /// Day.
    pub day: Option<Weekday>,
}

/// Timetable repository.
#[derive(Debug, Clone)]
pub struct TimetableRepository {
    db: DatabaseConnection,
}

impl TimetableRepository {
    /// Creates a new timetable repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists entries ordered by day, then start time.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &TimetableFilter,
    ) -> Result<Vec<timetables::Model>, DbErr> {
        let mut query = timetables::Entity::find()
            .filter(timetables::Column::SchoolId.eq(school_id))
            .order_by_asc(timetables::Column::StartTime);
        if let Some(id) = filter.class_id {
            query = query.filter(timetables::Column::ClassId.eq(id));
        }
        if let Some(id) = filter.teacher_id {
            query = query.filter(timetables::Column::TeacherId.eq(id));
        }
        if let Some(day) = filter.day {
            let day = sea_orm_active_enums::Weekday::from(day);
            query = query.filter(timetables::Column::DayOfWeek.eq(day));
        }

        let mut entries = query.all(&self.db).await?;
        entries.sort_by_key(|e| Weekday::from(e.day_of_week));
        Ok(entries)
    }

    /// Finds an entry of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<timetables::Model>, DbErr> {
        timetables::Entity::find_by_id(id)
            .filter(timetables::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Creates an entry.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: TimetableInput,
    ) -> Result<timetables::Model, TimetableError> {
        let txn = self.db.begin().await?;
        lock_school(&txn, school_id).await?;

        let id = Uuid::now_v7();
        let section_id = check_slot(&txn, school_id, id, &input).await?;

        let timestamp = now();
        let entry = timetables::ActiveModel {
            id: Set(id),
            school_id: Set(school_id),
            section_id: Set(section_id),
            class_id: Set(input.class_id),
            subject_id: Set(input.subject_id),
            teacher_id: Set(input.teacher_id),
            day_of_week: Set(input.day.into()),
            start_time: Set(input.start_time),
            end_time: Set(input.end_time),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!(
            school_id = %school_id,
            timetable_id = %entry.id,
            class_id = %entry.class_id,
            teacher_id = %entry.teacher_id,
            "Timetable entry created"
        );
        Ok(entry)
    }

    /// Replaces an entry.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: TimetableInput,
    ) -> Result<timetables::Model, TimetableError> {
        let txn = self.db.begin().await?;
        lock_school(&txn, school_id).await?;

        let entry = timetables::Entity::find_by_id(id)
            .filter(timetables::Column::SchoolId.eq(school_id))
            .one(&txn)
            .await?
            .ok_or(TimetableError::NotFound(id))?;
        let section_id = check_slot(&txn, school_id, id, &input).await?;

        let mut active = entry.into_active_model();
        active.section_id = Set(section_id);
        active.class_id = Set(input.class_id);
        active.subject_id = Set(input.subject_id);
        active.teacher_id = Set(input.teacher_id);
        active.day_of_week = Set(input.day.into());
        active.start_time = Set(input.start_time);
        active.end_time = Set(input.end_time);
        active.updated_at = Set(now());
        let entry = active.update(&txn).await?;
        txn.commit().await?;

        Ok(entry)
    }

    /// Deletes an entry.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), TimetableError> {
        let result = timetables::Entity::delete_many()
            .filter(timetables::Column::Id.eq(id))
            .filter(timetables::Column::SchoolId.eq(school_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TimetableError::NotFound(id));
        }
        Ok(())
    }
}

/// Validates references and the period of entry `id`, returning the class's
/// section.
async fn check_slot<C: ConnectionTrait>(
    conn: &C,
    school_id: Uuid,
    id: Uuid,
    input: &TimetableInput,
) -> Result<Uuid, TimetableError> {
    let slot = TimeSlot::new(input.start_time, input.end_time)?;
    let section_id = class_section(conn, school_id, input.class_id, input.subject_id)
        .await?
        .map_err(TimetableError::InvalidReference)?;

    let teacher = users::Entity::find_by_id(input.teacher_id)
        .filter(users::Column::SchoolId.eq(school_id))
        .one(conn)
        .await?;
    if !teacher.is_some_and(|t| t.is_active && UserRole::from(t.role).can_teach()) {
        return Err(TimetableError::InvalidReference(format!(
            "teacher {}",
            input.teacher_id
        )));
    }

    let candidate = ScheduledSlot {
        id,
        class_id: ClassId::from_uuid(input.class_id),
        teacher_id: UserId::from_uuid(input.teacher_id),
        day: input.day,
        slot,
    };
    let day = sea_orm_active_enums::Weekday::from(input.day);
    let existing: Vec<ScheduledSlot> = timetables::Entity::find()
        .filter(timetables::Column::SchoolId.eq(school_id))
        .filter(timetables::Column::DayOfWeek.eq(day))
        .filter(
            Condition::any()
                .add(timetables::Column::ClassId.eq(input.class_id))
                .add(timetables::Column::TeacherId.eq(input.teacher_id)),
        )
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|entry| {
            let slot = TimeSlot::new(entry.start_time, entry.end_time).ok()?;
            Some(ScheduledSlot {
                id: entry.id,
                class_id: ClassId::from_uuid(entry.class_id),
                teacher_id: UserId::from_uuid(entry.teacher_id),
                day: entry.day_of_week.into(),
                slot,
            })
        })
        .collect();

    if let Some(clash) = candidate.find_clash(&existing) {
        return Err(clash.into());
    }
    Ok(section_id)
}
