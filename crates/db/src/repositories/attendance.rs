//! Attendance repository.

use chrono::NaiveDate;
use scholaris_core::attendance::AttendanceSummary;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{Page, fetch_page, now};
use crate::entities::{
    attendances, classes, section_students, sea_orm_active_enums::AttendanceStatus, students,
};

/// Error types for attendance operations.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    /// Class not found in this school.
    #[error("Class not found: {0}")]
    ClassNotFound(Uuid),

    /// Student is not in the class.
    #[error("Student {0} is not in this class")]
    StudentNotInClass(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// One student's mark.
#[derive(Debug, Clone)]
pub struct AttendanceMark {
    /// Student.
    pub student_id: Uuid,
    /// Status.
    pub status: AttendanceStatus,
    /// Remark.
    pub remark: Option<String>,
}

/// Attendance repository.
#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    db: DatabaseConnection,
}

impl AttendanceRepository {
    /// Creates a new attendance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a class register for one day.
    ///
    /// Upserts on (student, date) in one transaction. Any failure rolls back
    /// the whole register.
    pub async fn mark(
        &self,
        school_id: Uuid,
        class_id: Uuid,
        date: NaiveDate,
        recorded_by: Uuid,
        marks: Vec<AttendanceMark>,
    ) -> Result<Vec<attendances::Model>, AttendanceError> {
        let class = classes::Entity::find_by_id(class_id)
            .filter(classes::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await?
            .ok_or(AttendanceError::ClassNotFound(class_id))?;

        let roster: Vec<Uuid> = students::Entity::find()
            .select_only()
            .column(students::Column::Id)
            .filter(students::Column::SchoolId.eq(school_id))
            .filter(students::Column::ClassId.eq(class.id))
            .into_tuple()
            .all(&self.db)
            .await?;
        if let Some(stray) = marks.iter().find(|m| !roster.contains(&m.student_id)) {
            return Err(AttendanceError::StudentNotInClass(stray.student_id));
        }

        let txn = self.db.begin().await?;
        let mut saved = Vec::with_capacity(marks.len());
        for mark in marks {
            let existing = attendances::Entity::find()
                .filter(attendances::Column::StudentId.eq(mark.student_id))
                .filter(attendances::Column::Date.eq(date))
                .one(&txn)
                .await?;

            let timestamp = now();
            let row = match existing {
                Some(row) => {
                    let mut active = row.into_active_model();
                    active.class_id = Set(class.id);
                    active.status = Set(mark.status);
                    active.remark = Set(mark.remark);
                    active.recorded_by = Set(Some(recorded_by));
                    active.updated_at = Set(timestamp);
                    active.update(&txn).await?
                }
                None => {
                    attendances::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        school_id: Set(school_id),
                        class_id: Set(class.id),
                        student_id: Set(mark.student_id),
                        date: Set(date),
                        status: Set(mark.status),
                        remark: Set(mark.remark),
                        recorded_by: Set(Some(recorded_by)),
                        created_at: Set(timestamp),
                        updated_at: Set(timestamp),
                    }
                    .insert(&txn)
                    .await?
                }
            };
            saved.push(row);
        }
        txn.commit().await?;

        tracing::info!(
            school_id = %school_id,
            class_id = %class_id,
            %date,
            count = saved.len(),
            "Attendance recorded"
        );
        Ok(saved)
    }

    /// A class register for one day.
    pub async fn for_class(
        &self,
        school_id: Uuid,
        class_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<attendances::Model>, DbErr> {
        attendances::Entity::find()
            .filter(attendances::Column::SchoolId.eq(school_id))
            .filter(attendances::Column::ClassId.eq(class_id))
            .filter(attendances::Column::Date.eq(date))
            .all(&self.db)
            .await
    }

    /// One student's attendance, most recent first.
    pub async fn history(
        &self,
        school_id: Uuid,
        student_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: &PageRequest,
    ) -> Result<Page<attendances::Model>, DbErr> {
        let mut query = attendances::Entity::find()
            .filter(attendances::Column::SchoolId.eq(school_id))
            .filter(attendances::Column::StudentId.eq(student_id))
            .order_by_desc(attendances::Column::Date);
        if let Some(from) = from {
            query = query.filter(attendances::Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(attendances::Column::Date.lte(to));
        }
        fetch_page(&self.db, query, page).await
    }

    /// Attendance totals for the active members of a section on one day.
    pub async fn section_summary(
        &self,
        school_id: Uuid,
        section_id: Uuid,
        date: NaiveDate,
    ) -> Result<AttendanceSummary, DbErr> {
        let member_ids: Vec<Uuid> = section_students::Entity::find()
            .select_only()
            .column(section_students::Column::StudentId)
            .filter(section_students::Column::SectionId.eq(section_id))
            .into_tuple()
            .all(&self.db)
            .await?;

        let total = students::Entity::find()
            .filter(students::Column::SchoolId.eq(school_id))
            .filter(students::Column::IsActive.eq(true))
            .filter(students::Column::Id.is_in(member_ids.iter().copied()))
            .count(&self.db)
            .await?;

        let statuses: Vec<AttendanceStatus> = attendances::Entity::find()
            .select_only()
            .column(attendances::Column::Status)
            .filter(attendances::Column::SchoolId.eq(school_id))
            .filter(attendances::Column::Date.eq(date))
            .filter(attendances::Column::StudentId.is_in(member_ids))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(AttendanceSummary::from_statuses(
            total,
            statuses.into_iter().map(Into::into),
        ))
    }
}
