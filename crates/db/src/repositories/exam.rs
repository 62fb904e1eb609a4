//! Exam repository: exams, graded results and parent notifications.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use scholaris_core::grading::{
    self, Grade, GradingError, RESULT_PUBLISHED_KIND, RESULT_PUBLISHED_TITLE,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use scholaris_shared::types::PageRequest;
use serde_json::json;
use uuid::Uuid;

use super::common::{Page, fetch_page, now};
use super::notification::{self, NewNotification};
use crate::entities::{
    academic_sessions, classes, exam_results, exams, students, subjects, terms,
};

/// Error types for exam operations.
#[derive(Debug, thiserror::Error)]
pub enum ExamError {
    /// Exam not found in this school.
    #[error("Exam not found: {0}")]
    NotFound(Uuid),

    /// A referenced row is not part of this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Maximum score must be positive.
    #[error("max_score must be greater than zero")]
    InvalidMaxScore,

    /// Submitted score is out of range.
    #[error("Result for student {student_id}: {source}")]
    InvalidScore {
        /// Student whose score was rejected.
        student_id: Uuid,
        /// Range violation.
        source: GradingError,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or replacing an exam.
#[derive(Debug, Clone)]
pub struct ExamInput {
    /// Class sitting the exam.
    pub class_id: Uuid,
    /// Subject.
    pub subject_id: Uuid,
    /// Academic session.
    pub session_id: Uuid,
    /// Term.
    pub term_id: Uuid,
    /// Title, e.g. "Mid-term Test".
    pub title: String,
    /// Highest attainable score.
    pub max_score: Decimal,
    /// Day of the exam.
    pub exam_date: Option<NaiveDate>,
}

/// Filter options for listing exams.
#[derive(Debug, Clone, Default)]
pub struct ExamFilter {
    /// Class.
    pub class_id: Option<Uuid>,
    /// Subject.
    pub subject_id: Option<Uuid>,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
}

/// One submitted score.
#[derive(Debug, Clone)]
pub struct ResultInput {
    /// Student.
    pub student_id: Uuid,
    /// Score.
    pub score: Decimal,
    /// Teacher's remark.
    pub remark: Option<String>,
}

/// Exam repository.
#[derive(Debug, Clone)]
pub struct ExamRepository {
    db: DatabaseConnection,
}

impl ExamRepository {
    /// Creates a new exam repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an exam of the given school.
    pub async fn find(&self, school_id: Uuid, id: Uuid) -> Result<Option<exams::Model>, DbErr> {
        exams::Entity::find_by_id(id)
            .filter(exams::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Lists exams, most recent first.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &ExamFilter,
        page: &PageRequest,
    ) -> Result<Page<exams::Model>, DbErr> {
        let mut query = exams::Entity::find()
            .filter(exams::Column::SchoolId.eq(school_id))
            .order_by_desc(exams::Column::CreatedAt);
        if let Some(id) = filter.class_id {
            query = query.filter(exams::Column::ClassId.eq(id));
        }
        if let Some(id) = filter.subject_id {
            query = query.filter(exams::Column::SubjectId.eq(id));
        }
        if let Some(id) = filter.session_id {
            query = query.filter(exams::Column::SessionId.eq(id));
        }
        if let Some(id) = filter.term_id {
            query = query.filter(exams::Column::TermId.eq(id));
        }
        fetch_page(&self.db, query, page).await
    }

    /// Creates an exam.
    pub async fn create(
        &self,
        school_id: Uuid,
        created_by: Uuid,
        input: ExamInput,
    ) -> Result<exams::Model, ExamError> {
        self.check_references(school_id, &input).await?;

        let timestamp = now();
        let exam = exams::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            class_id: Set(input.class_id),
            subject_id: Set(input.subject_id),
            session_id: Set(input.session_id),
            term_id: Set(input.term_id),
            title: Set(input.title),
            max_score: Set(input.max_score),
            exam_date: Set(input.exam_date),
            created_by: Set(Some(created_by)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(school_id = %school_id, exam_id = %exam.id, "Exam created");
        Ok(exam)
    }

    /// Replaces an exam.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: ExamInput,
    ) -> Result<exams::Model, ExamError> {
        let exam = self
            .find(school_id, id)
            .await?
            .ok_or(ExamError::NotFound(id))?;
        self.check_references(school_id, &input).await?;

        let mut active = exam.into_active_model();
        active.class_id = Set(input.class_id);
        active.subject_id = Set(input.subject_id);
        active.session_id = Set(input.session_id);
        active.term_id = Set(input.term_id);
        active.title = Set(input.title);
        active.max_score = Set(input.max_score);
        active.exam_date = Set(input.exam_date);
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an exam and its results.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), ExamError> {
        self.find(school_id, id)
            .await?
            .ok_or(ExamError::NotFound(id))?;

        let txn = self.db.begin().await?;
        exam_results::Entity::delete_many()
            .filter(exam_results::Column::ExamId.eq(id))
            .exec(&txn)
            .await?;
        exams::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(school_id = %school_id, exam_id = %id, "Exam deleted");
        Ok(())
    }

    /// Results of an exam.
    pub async fn results(&self, exam_id: Uuid) -> Result<Vec<exam_results::Model>, DbErr> {
        exam_results::Entity::find()
            .filter(exam_results::Column::ExamId.eq(exam_id))
            .order_by_desc(exam_results::Column::Score)
            .all(&self.db)
            .await
    }

    /// Grades and stores a batch of scores.
    ///
    /// Every row is upserted on (exam, student) inside one transaction; a
    /// single invalid row rejects the whole batch. A student listed twice
    /// keeps the last score. Once committed, parents
    /// of the graded students are notified. Notification failures are
    /// logged and do not affect the saved results.
    pub async fn save_results(
        &self,
        school_id: Uuid,
        exam_id: Uuid,
        graded_by: Uuid,
        batch: Vec<ResultInput>,
    ) -> Result<Vec<exam_results::Model>, ExamError> {
        let exam = self
            .find(school_id, exam_id)
            .await?
            .ok_or(ExamError::NotFound(exam_id))?;

        let batch = last_per_student(batch);
        for row in &batch {
            grading::validate_score(row.score, exam.max_score).map_err(|source| {
                ExamError::InvalidScore {
                    student_id: row.student_id,
                    source,
                }
            })?;
        }

        let student_ids: Vec<Uuid> = batch.iter().map(|r| r.student_id).collect();
        let roster: HashMap<Uuid, students::Model> = students::Entity::find()
            .filter(students::Column::SchoolId.eq(school_id))
            .filter(students::Column::Id.is_in(student_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        if let Some(missing) = batch.iter().find(|r| !roster.contains_key(&r.student_id)) {
            return Err(ExamError::InvalidReference(format!(
                "student {}",
                missing.student_id
            )));
        }

        let txn = self.db.begin().await?;
        let mut saved = Vec::with_capacity(batch.len());
        for row in batch {
            let grade = Grade::from_score(row.score).to_string();
            let existing = exam_results::Entity::find()
                .filter(exam_results::Column::ExamId.eq(exam_id))
                .filter(exam_results::Column::StudentId.eq(row.student_id))
                .one(&txn)
                .await?;

            let timestamp = now();
            let result = match existing {
                Some(result) => {
                    let mut active = result.into_active_model();
                    active.score = Set(row.score);
                    active.grade = Set(grade);
                    active.remark = Set(row.remark);
                    active.graded_by = Set(Some(graded_by));
                    active.updated_at = Set(timestamp);
                    active.update(&txn).await?
                }
                None => {
                    exam_results::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        exam_id: Set(exam_id),
                        student_id: Set(row.student_id),
                        score: Set(row.score),
                        grade: Set(grade),
                        remark: Set(row.remark),
                        graded_by: Set(Some(graded_by)),
                        created_at: Set(timestamp),
                        updated_at: Set(timestamp),
                    }
                    .insert(&txn)
                    .await?
                }
            };
            saved.push(result);
        }
        txn.commit().await?;

        tracing::info!(
            school_id = %school_id,
            exam_id = %exam_id,
            count = saved.len(),
            "Exam results saved"
        );

        self.notify_parents(&exam, &saved, &roster).await;
        Ok(saved)
    }

    async fn notify_parents(
        &self,
        exam: &exams::Model,
        saved: &[exam_results::Model],
        roster: &HashMap<Uuid, students::Model>,
    ) {
        let subject_name = match subjects::Entity::find_by_id(exam.subject_id).one(&self.db).await {
            Ok(subject) => subject.map_or_else(|| exam.title.clone(), |s| s.name),
            Err(e) => {
                tracing::warn!(exam_id = %exam.id, error = %e, "Failed to load subject for notifications");
                return;
            }
        };

        let batch: Vec<NewNotification> = saved
            .iter()
            .filter_map(|result| {
                let student = roster.get(&result.student_id)?;
                let parent_id = student.parent_id?;
                Some(NewNotification {
                    user_id: parent_id,
                    kind: RESULT_PUBLISHED_KIND.to_string(),
                    title: RESULT_PUBLISHED_TITLE.to_string(),
                    message: grading::result_published_message(&student.student_name, &subject_name),
                    data: Some(json!({
                        "exam_id": exam.id,
                        "student_id": student.id,
                    })),
                })
            })
            .collect();

        if let Err(e) = notification::insert_many(&self.db, batch).await {
            tracing::warn!(exam_id = %exam.id, error = %e, "Failed to notify parents of exam results");
        }
    }

    async fn check_references(&self, school_id: Uuid, input: &ExamInput) -> Result<(), ExamError> {
        if input.max_score <= Decimal::ZERO {
            return Err(ExamError::InvalidMaxScore);
        }

        let class = classes::Entity::find_by_id(input.class_id)
            .filter(classes::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await?;
        if class == 0 {
            return Err(ExamError::InvalidReference(format!("class {}", input.class_id)));
        }
        let subject = subjects::Entity::find_by_id(input.subject_id)
            .filter(subjects::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await?;
        if subject == 0 {
            return Err(ExamError::InvalidReference(format!("subject {}", input.subject_id)));
        }
        let session = academic_sessions::Entity::find_by_id(input.session_id)
            .filter(academic_sessions::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await?;
        if session == 0 {
            return Err(ExamError::InvalidReference(format!("session {}", input.session_id)));
        }
        let term = terms::Entity::find_by_id(input.term_id)
            .filter(terms::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await?;
        if term == 0 {
            return Err(ExamError::InvalidReference(format!("term {}", input.term_id)));
        }
        Ok(())
    }
}

/// Keeps the last row for each student, in the order of those last rows.
fn last_per_student(batch: Vec<ResultInput>) -> Vec<ResultInput> {
    let mut last: HashMap<Uuid, usize> = HashMap::with_capacity(batch.len());
    for (index, row) in batch.iter().enumerate() {
        last.insert(row.student_id, index);
    }
    batch
        .into_iter()
        .enumerate()
        .filter(|(index, row)| last.get(&row.student_id) == Some(index))
        .map(|(_, row)| row)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(student_id: Uuid, score: i64) -> ResultInput {
        ResultInput {
            student_id,
            score: Decimal::from(score),
            remark: None,
        }
    }

    #[test]
    fn test_last_per_student_keeps_latest_score() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let kept = last_per_student(vec![row(a, 40), row(b, 55), row(a, 72)]);

        let scores: Vec<(Uuid, Decimal)> = kept.iter().map(|r| (r.student_id, r.score)).collect();
        assert_eq!(scores, vec![(b, Decimal::from(55)), (a, Decimal::from(72))]);
    }
}
