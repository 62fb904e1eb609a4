//! Student repository: enrolment, admission numbers and section memberships.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use scholaris_core::registration::{self, STUDENT_PREFIX};
use scholaris_shared::types::PageRequest;
use serde::Serialize;
use uuid::Uuid;

use super::common::{MAX_ID_ATTEMPTS, Page, fetch_page, is_unique_violation, lock_school, now};
use crate::entities::{
    classes, section_students, sections, sea_orm_active_enums::UserRole, students, users,
};

/// Error types for student operations.
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    /// Student not found in this school.
    #[error("Student not found: {0}")]
    NotFound(Uuid),

    /// School not found.
    #[error("School not found: {0}")]
    SchoolNotFound(Uuid),

    /// Class, section or parent is not part of this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Admission number already used.
    #[error("Admission number '{0}' is already in use")]
    DuplicateAdmissionNumber(String),

    /// Could not issue a unique admission number.
    #[error("Could not allocate an admission number after {0} attempts")]
    AdmissionNumberExhausted(u32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for enrolling a student.
#[derive(Debug, Clone, Default)]
pub struct CreateStudentInput {
    /// Class the student sits in.
    pub class_id: Option<Uuid>,
    /// Parent user account.
    pub parent_id: Option<Uuid>,
    /// Full name.
    pub student_name: String,
    /// Explicit admission number. Generated when absent.
    pub admission_number: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Gender.
    pub gender: Option<String>,
    /// Home address.
    pub address: Option<String>,
    /// Parent's name.
    pub parent_name: Option<String>,
    /// Parent's phone.
    pub parent_phone: Option<String>,
    /// Parent's email.
    pub parent_email: Option<String>,
    /// Photo URL.
    pub photo_url: Option<String>,
    /// Section memberships.
    pub section_ids: Vec<Uuid>,
}

/// Input for updating a student. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateStudentInput {
    /// Class.
    pub class_id: Option<Option<Uuid>>,
    /// Parent user account.
    pub parent_id: Option<Option<Uuid>>,
    /// Full name.
    pub student_name: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<Option<NaiveDate>>,
    /// Gender.
    pub gender: Option<Option<String>>,
    /// Home address.
    pub address: Option<Option<String>>,
    /// Parent's name.
    pub parent_name: Option<Option<String>>,
    /// Parent's phone.
    pub parent_phone: Option<Option<String>>,
    /// Parent's email.
    pub parent_email: Option<Option<String>>,
    /// Photo URL.
    pub photo_url: Option<Option<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Replaces all section memberships.
    pub section_ids: Option<Vec<Uuid>>,
}

/// Filter options for listing students.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Only students of this class.
    pub class_id: Option<Uuid>,
    /// Only members of this section.
    pub section_id: Option<Uuid>,
    /// Only this parent's children.
    pub parent_id: Option<Uuid>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Name or admission number contains.
    pub search: Option<String>,
}

/// A student together with their section memberships.
#[derive(Debug, Clone, Serialize)]
pub struct StudentWithSections {
    /// Student row.
    pub student: students::Model,
    /// Sections the student belongs to.
    pub section_ids: Vec<Uuid>,
}

/// One failed row of a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRowError {
    /// Zero-based row index in the submitted batch.
    pub row: usize,
    /// Student name from the row.
    pub student_name: String,
    /// Why the row was rejected.
    pub message: String,
}

/// Result of a bulk import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    /// Students that were created.
    pub created: Vec<students::Model>,
    /// Rows that failed.
    pub errors: Vec<ImportRowError>,
}

/// Student repository.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    db: DatabaseConnection,
}

impl StudentRepository {
    /// Creates a new student repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a student of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<students::Model>, DbErr> {
        students::Entity::find_by_id(id)
            .filter(students::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Finds a student with their sections.
    pub async fn find_with_sections(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<StudentWithSections>, DbErr> {
        let Some(student) = self.find(school_id, id).await? else {
            return Ok(None);
        };
        let section_ids = section_ids_of(&self.db, id).await?;
        Ok(Some(StudentWithSections {
            student,
            section_ids,
        }))
    }

    /// Lists students of a school.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &StudentFilter,
        page: &PageRequest,
    ) -> Result<Page<students::Model>, DbErr> {
        let mut query = students::Entity::find()
            .filter(students::Column::SchoolId.eq(school_id))
            .order_by_asc(students::Column::StudentName);

        if let Some(class_id) = filter.class_id {
            query = query.filter(students::Column::ClassId.eq(class_id));
        }
        if let Some(parent_id) = filter.parent_id {
            query = query.filter(students::Column::ParentId.eq(parent_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(students::Column::IsActive.eq(is_active));
        }
        if let Some(section_id) = filter.section_id {
            let member_ids: Vec<Uuid> = section_students::Entity::find()
                .select_only()
                .column(section_students::Column::StudentId)
                .filter(section_students::Column::SectionId.eq(section_id))
                .into_tuple()
                .all(&self.db)
                .await?;
            query = query.filter(students::Column::Id.is_in(member_ids));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(students::Column::StudentName.contains(search))
                    .add(students::Column::AdmissionNumber.contains(search)),
            );
        }

        fetch_page(&self.db, query, page).await
    }

    /// Section memberships of many students, keyed by student.
    pub async fn sections_by_student(
        &self,
        student_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Uuid>>, DbErr> {
        let rows = section_students::Entity::find()
            .filter(section_students::Column::StudentId.is_in(student_ids.iter().copied()))
            .all(&self.db)
            .await?;

        let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in rows {
            map.entry(row.student_id).or_default().push(row.section_id);
        }
        Ok(map)
    }

    /// Enrols a student, generating an admission number when none is given.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: CreateStudentInput,
    ) -> Result<StudentWithSections, StudentError> {
        self.check_references(
            school_id,
            input.class_id,
            input.parent_id,
            &input.section_ids,
        )
        .await?;

        if let Some(number) = &input.admission_number {
            let taken = students::Entity::find()
                .filter(students::Column::AdmissionNumber.eq(number.as_str()))
                .count(&self.db)
                .await?;
            if taken > 0 {
                return Err(StudentError::DuplicateAdmissionNumber(number.clone()));
            }
        }

        for attempt in 1..=MAX_ID_ATTEMPTS {
            match self.try_create(school_id, &input).await {
                Err(StudentError::Database(e)) if is_unique_violation(&e) => {
                    if let Some(number) = &input.admission_number {
                        return Err(StudentError::DuplicateAdmissionNumber(number.clone()));
                    }
                    tracing::warn!(school_id = %school_id, attempt, "Admission number collision, retrying");
                }
                other => return other,
            }
        }

        Err(StudentError::AdmissionNumberExhausted(MAX_ID_ATTEMPTS))
    }

    async fn try_create(
        &self,
        school_id: Uuid,
        input: &CreateStudentInput,
    ) -> Result<StudentWithSections, StudentError> {
        let txn = self.db.begin().await?;
        let school = lock_school(&txn, school_id)
            .await?
            .ok_or(StudentError::SchoolNotFound(school_id))?;

        let admission_number = if let Some(number) = &input.admission_number {
            number.clone()
        } else {
            let stem = registration::id_stem(&school.short_code, STUDENT_PREFIX);
            let issued: Vec<String> = students::Entity::find()
                .select_only()
                .column(students::Column::AdmissionNumber)
                .filter(students::Column::SchoolId.eq(school_id))
                .filter(students::Column::AdmissionNumber.starts_with(&stem))
                .into_tuple()
                .all(&txn)
                .await?;
            registration::next_id(
                &school.short_code,
                STUDENT_PREFIX,
                issued.iter().map(String::as_str),
            )
        };

        let timestamp = now();
        let student = students::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            class_id: Set(input.class_id),
            parent_id: Set(input.parent_id),
            student_name: Set(input.student_name.clone()),
            admission_number: Set(admission_number),
            date_of_birth: Set(input.date_of_birth),
            gender: Set(input.gender.clone()),
            address: Set(input.address.clone()),
            parent_name: Set(input.parent_name.clone()),
            parent_phone: Set(input.parent_phone.clone()),
            parent_email: Set(input.parent_email.clone()),
            photo_url: Set(input.photo_url.clone()),
            is_active: Set(true),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;

        let section_ids = replace_sections(&txn, student.id, &input.section_ids).await?;
        txn.commit().await?;

        tracing::info!(
            school_id = %school_id,
            student_id = %student.id,
            admission_number = %student.admission_number,
            "Student enrolled"
        );
        Ok(StudentWithSections {
            student,
            section_ids,
        })
    }

    /// Updates a student and optionally replaces their sections.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: UpdateStudentInput,
    ) -> Result<StudentWithSections, StudentError> {
        let student = self
            .find(school_id, id)
            .await?
            .ok_or(StudentError::NotFound(id))?;
        self.check_references(
            school_id,
            input.class_id.flatten(),
            input.parent_id.flatten(),
            input.section_ids.as_deref().unwrap_or_default(),
        )
        .await?;

        let txn = self.db.begin().await?;
        let mut active = student.into_active_model();
        if let Some(v) = input.class_id {
            active.class_id = Set(v);
        }
        if let Some(v) = input.parent_id {
            active.parent_id = Set(v);
        }
        if let Some(v) = input.student_name {
            active.student_name = Set(v);
        }
        if let Some(v) = input.date_of_birth {
            active.date_of_birth = Set(v);
        }
        if let Some(v) = input.gender {
            active.gender = Set(v);
        }
        if let Some(v) = input.address {
            active.address = Set(v);
        }
        if let Some(v) = input.parent_name {
            active.parent_name = Set(v);
        }
        if let Some(v) = input.parent_phone {
            active.parent_phone = Set(v);
        }
        if let Some(v) = input.parent_email {
            active.parent_email = Set(v);
        }
        if let Some(v) = input.photo_url {
            active.photo_url = Set(v);
        }
        if let Some(v) = input.is_active {
            active.is_active = Set(v);
        }
        active.updated_at = Set(now());
        let student = active.update(&txn).await?;

        let section_ids = match &input.section_ids {
            Some(ids) => replace_sections(&txn, id, ids).await?,
            None => section_ids_of(&txn, id).await?,
        };
        txn.commit().await?;

        Ok(StudentWithSections {
            student,
            section_ids,
        })
    }

    /// Deletes a student together with their section memberships.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), StudentError> {
        self.find(school_id, id)
            .await?
            .ok_or(StudentError::NotFound(id))?;

        let txn = self.db.begin().await?;
        section_students::Entity::delete_many()
            .filter(section_students::Column::StudentId.eq(id))
            .exec(&txn)
            .await?;
        students::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(school_id = %school_id, student_id = %id, "Student deleted");
        Ok(())
    }

    /// Enrols each row independently, collecting the rows that fail.
    pub async fn import(
        &self,
        school_id: Uuid,
        rows: Vec<CreateStudentInput>,
    ) -> Result<ImportOutcome, DbErr> {
        let mut outcome = ImportOutcome::default();

        for (row, input) in rows.into_iter().enumerate() {
            let student_name = input.student_name.clone();
            match self.create(school_id, input).await {
                Ok(created) => outcome.created.push(created.student),
                Err(StudentError::Database(e)) if !is_unique_violation(&e) => return Err(e),
                Err(e) => outcome.errors.push(ImportRowError {
                    row,
                    student_name,
                    message: e.to_string(),
                }),
            }
        }

        tracing::info!(
            school_id = %school_id,
            created = outcome.created.len(),
            failed = outcome.errors.len(),
            "Student import finished"
        );
        Ok(outcome)
    }

    async fn check_references(
        &self,
        school_id: Uuid,
        class_id: Option<Uuid>,
        parent_id: Option<Uuid>,
        section_ids: &[Uuid],
    ) -> Result<(), StudentError> {
        if let Some(class_id) = class_id {
            let found = classes::Entity::find_by_id(class_id)
                .filter(classes::Column::SchoolId.eq(school_id))
                .count(&self.db)
                .await?;
            if found == 0 {
                return Err(StudentError::InvalidReference(format!("class {class_id}")));
            }
        }

        if let Some(parent_id) = parent_id {
            let found = users::Entity::find_by_id(parent_id)
                .filter(users::Column::SchoolId.eq(school_id))
                .filter(users::Column::Role.eq(UserRole::Parent))
                .count(&self.db)
                .await?;
            if found == 0 {
                return Err(StudentError::InvalidReference(format!("parent {parent_id}")));
            }
        }

        if !section_ids.is_empty() {
            let found = sections::Entity::find()
                .filter(sections::Column::SchoolId.eq(school_id))
                .filter(sections::Column::Id.is_in(section_ids.iter().copied()))
                .count(&self.db)
                .await?;
            let mut distinct = section_ids.to_vec();
            distinct.sort_unstable();
            distinct.dedup();
            if found != distinct.len() as u64 {
                return Err(StudentError::InvalidReference("section".to_string()));
            }
        }

        Ok(())
    }
}

async fn section_ids_of<C: ConnectionTrait>(conn: &C, student_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
    section_students::Entity::find()
        .select_only()
        .column(section_students::Column::SectionId)
        .filter(section_students::Column::StudentId.eq(student_id))
        .into_tuple()
        .all(conn)
        .await
}

async fn replace_sections<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    section_ids: &[Uuid],
) -> Result<Vec<Uuid>, DbErr> {
    section_students::Entity::delete_many()
        .filter(section_students::Column::StudentId.eq(student_id))
        .exec(conn)
        .await?;

    let mut ids = section_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(ids);
    }

    let timestamp = now();
    section_students::Entity::insert_many(ids.iter().map(|&section_id| {
        section_students::ActiveModel {
            section_id: Set(section_id),
            student_id: Set(student_id),
            created_at: Set(timestamp),
        }
    }))
    .exec_without_returning(conn)
    .await?;

    Ok(ids)
}
