//! Student routes: enrolment, bulk import, ledger and fee position.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scholaris_core::auth::UserRole;
use scholaris_core::fees::PeriodFilter;
use scholaris_db::{
    CreateStudentInput, ImportRowError, ReportRepository, StudentFilter, StudentRepository,
    StudentWithSections, TransactionFilter, TransactionRepository, UpdateStudentInput,
    entities::{students, transactions},
};
use scholaris_shared::types::{PageRequest, PageResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{ValidatedJson, nullable},
    middleware::AuthUser,
};

/// Creates the student routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school}/students", get(list_students).post(create_student))
        .route("/schools/{school}/students/import", post(import_students))
        .route(
            "/schools/{school}/students/{student}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route(
            "/schools/{school}/students/{student}/transactions",
            get(student_transactions),
        )
        .route(
            "/schools/{school}/students/{student}/payment-summary",
            get(payment_summary),
        )
}

/// Loads a student the caller may see.
///
/// Staff see every student of their school; parents only their children.
pub(crate) async fn visible_student(
    state: &AppState,
    auth: &AuthUser,
    school_id: Uuid,
    student_id: Uuid,
) -> ApiResult<students::Model> {
    let role = auth.role()?;
    let student = StudentRepository::new(state.conn())
        .find(school_id, student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    if !role.is_staff() && student.parent_id != Some(auth.user_id()) {
        return Err(ApiError::forbidden("You can only view your own children."));
    }
    Ok(student)
}

/// Query parameters for listing students.
#[derive(Debug, Deserialize)]
pub struct ListStudentsQuery {
    /// Filter by class.
    pub class_id: Option<Uuid>,
    /// Filter by section membership.
    pub section_id: Option<Uuid>,
    /// Filter by parent account.
    pub parent_id: Option<Uuid>,
    /// Filter by active status.
    pub active: Option<bool>,
    /// Matches name or admission number.
    pub search: Option<String>,
}

/// Request body for enrolling a student.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudentRequest {
    /// Full name.
    #[validate(length(min = 1, max = 255, message = "Student name is required"))]
    pub student_name: String,
    /// Admission number; generated when omitted.
    pub admission_number: Option<String>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Parent account.
    pub parent_id: Option<Uuid>,
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
    #[validate(email(message = "Parent email must be a valid email address"))]
    pub parent_email: Option<String>,
    /// Photo URL.
    #[validate(url(message = "Photo URL must be a valid URL"))]
    pub photo_url: Option<String>,
    /// Sections the student belongs to.
    #[serde(default)]
    pub section_ids: Vec<Uuid>,
}

impl From<CreateStudentRequest> for CreateStudentInput {
    fn from(req: CreateStudentRequest) -> Self {
        Self {
            class_id: req.class_id,
            parent_id: req.parent_id,
            student_name: req.student_name.trim().to_string(),
            admission_number: req.admission_number.map(|n| n.trim().to_string()),
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            address: req.address,
            parent_name: req.parent_name,
            parent_phone: req.parent_phone,
            parent_email: req.parent_email,
            photo_url: req.photo_url,
            section_ids: req.section_ids,
        }
    }
}

/// Request body for updating a student. Omitted fields are left unchanged;
/// `null` clears nullable fields.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    /// Full name.
    #[validate(length(min = 1, max = 255, message = "Student name must not be empty"))]
    pub student_name: Option<String>,
    /// Class.
    #[serde(default, deserialize_with = "nullable")]
    pub class_id: Option<Option<Uuid>>,
    /// Parent account.
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Uuid>>,
    /// Date of birth.
    #[serde(default, deserialize_with = "nullable")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    /// Gender.
    #[serde(default, deserialize_with = "nullable")]
    pub gender: Option<Option<String>>,
    /// Home address.
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    /// Parent's name.
    #[serde(default, deserialize_with = "nullable")]
    pub parent_name: Option<Option<String>>,
    /// Parent's phone.
    #[serde(default, deserialize_with = "nullable")]
    pub parent_phone: Option<Option<String>>,
    /// Parent's email.
    #[serde(default, deserialize_with = "nullable")]
    pub parent_email: Option<Option<String>>,
    /// Photo URL.
    #[serde(default, deserialize_with = "nullable")]
    pub photo_url: Option<Option<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Replaces all section memberships.
    pub section_ids: Option<Vec<Uuid>>,
}

/// Request body for a bulk import.
#[derive(Debug, Deserialize)]
pub struct ImportStudentsRequest {
    /// Rows to enrol.
    pub students: Vec<CreateStudentRequest>,
}

/// Result of a bulk import.
#[derive(Debug, Serialize)]
pub struct ImportStudentsResponse {
    /// Number of students created.
    pub imported: usize,
    /// Created students.
    pub students: Vec<students::Model>,
    /// Rejected rows, indexed as submitted.
    pub errors: Vec<ImportRowError>,
}

/// A student with their section memberships.
#[derive(Debug, Serialize)]
pub struct StudentView {
    /// Student row.
    #[serde(flatten)]
    pub student: students::Model,
    /// Sections the student belongs to.
    pub section_ids: Vec<Uuid>,
}

impl From<StudentWithSections> for StudentView {
    fn from(s: StudentWithSections) -> Self {
        Self {
            student: s.student,
            section_ids: s.section_ids,
        }
    }
}

/// Query parameters for the payment summary.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// Restrict to one academic session.
    pub session_id: Option<Uuid>,
    /// Restrict to one term.
    pub term_id: Option<Uuid>,
}

impl From<PeriodQuery> for PeriodFilter {
    fn from(q: PeriodQuery) -> Self {
        Self {
            session_id: q.session_id.map(Into::into),
            term_id: q.term_id.map(Into::into),
        }
    }
}

/// A student's fee position.
#[derive(Debug, Serialize)]
pub struct PaymentSummaryResponse {
    /// Student.
    pub student_id: Uuid,
    /// Successful gateway payments plus fee income transactions.
    pub total_paid: Decimal,
    /// Fees charged to the student.
    pub total_fees: Decimal,
    /// Fees minus payments, negative when overpaid.
    pub balance: Decimal,
    /// Amount still owed, never negative.
    pub outstanding: Decimal,
    /// Number of counted payments.
    pub payment_count: u64,
    /// Most recent counted payment.
    pub last_payment: Option<chrono::DateTime<chrono::Utc>>,
}

/// GET `/schools/{school}/students` - List students.
async fn list_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Query(query): Query<ListStudentsQuery>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<StudentView>>> {
    let role = auth.role()?;
    let parent_id = if role.is_staff() {
        query.parent_id
    } else {
        Some(auth.user_id())
    };

    let filter = StudentFilter {
        class_id: query.class_id,
        section_id: query.section_id,
        parent_id,
        is_active: query.active,
        search: query.search,
    };
    let repo = StudentRepository::new(state.conn());
    let students = repo.list(school_id, &filter, &page).await?;

    let ids: Vec<Uuid> = students.items.iter().map(|s| s.id).collect();
    let mut sections = repo.sections_by_student(&ids).await?;
    let page = students.map(|student| StudentView {
        section_ids: sections.remove(&student.id).unwrap_or_default(),
        student,
    });

    Ok(Json(page.into()))
}

/// POST `/schools/{school}/students` - Enrol a student.
async fn create_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateStudentRequest>,
) -> ApiResult<(StatusCode, Json<StudentView>)> {
    auth.require(UserRole::can_manage_school)?;
    let created = StudentRepository::new(state.conn())
        .create(school_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// POST `/schools/{school}/students/import` - Enrol many students.
///
/// Each row succeeds or fails on its own. Answers 201 when every row was
/// imported and 207 when some were rejected.
async fn import_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(school_id): Path<Uuid>,
    Json(payload): Json<ImportStudentsRequest>,
) -> ApiResult<(StatusCode, Json<ImportStudentsResponse>)> {
    auth.require(UserRole::can_manage_school)?;
    if payload.students.is_empty() {
        return Err(ApiError::field("students", "At least one student is required"));
    }

    let mut errors = Vec::new();
    let mut rows = Vec::new();
    let mut positions = Vec::new();
    for (index, row) in payload.students.into_iter().enumerate() {
        match row.validate() {
            Ok(()) => {
                positions.push(index);
                rows.push(row.into());
            }
            Err(e) => errors.push(ImportRowError {
                row: index,
                student_name: row.student_name.clone(),
                message: e.to_string(),
            }),
        }
    }

    let outcome = StudentRepository::new(state.conn())
        .import(school_id, rows)
        .await?;
    errors.extend(outcome.errors.into_iter().map(|mut e| {
        e.row = positions.get(e.row).copied().unwrap_or(e.row);
        e
    }));
    errors.sort_by_key(|e| e.row);

    let status = if errors.is_empty() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((
        status,
        Json(ImportStudentsResponse {
            imported: outcome.created.len(),
            students: outcome.created,
            errors,
        }),
    ))
}

/// GET `/schools/{school}/students/{student}` - Show a student.
async fn get_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<StudentView>> {
    visible_student(&state, &auth, school_id, student_id).await?;
    StudentRepository::new(state.conn())
        .find_with_sections(school_id, student_id)
        .await?
        .map(|s| Json(s.into()))
        .ok_or_else(|| ApiError::not_found("Student not found"))
}

/// PUT `/schools/{school}/students/{student}` - Update a student.
async fn update_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<UpdateStudentRequest>,
) -> ApiResult<Json<StudentView>> {
    auth.require(UserRole::can_manage_school)?;
    let updated = StudentRepository::new(state.conn())
        .update(
            school_id,
            student_id,
            UpdateStudentInput {
                class_id: payload.class_id,
                parent_id: payload.parent_id,
                student_name: payload.student_name.map(|n| n.trim().to_string()),
                date_of_birth: payload.date_of_birth,
                gender: payload.gender,
                address: payload.address,
                parent_name: payload.parent_name,
                parent_phone: payload.parent_phone,
                parent_email: payload.parent_email,
                photo_url: payload.photo_url,
                is_active: payload.is_active,
                section_ids: payload.section_ids,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

/// DELETE `/schools/{school}/students/{student}` - Remove a student.
async fn delete_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require(UserRole::can_manage_school)?;
    StudentRepository::new(state.conn())
        .delete(school_id, student_id)
        .await?;
    info!(school_id = %school_id, student_id = %student_id, "Student deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/schools/{school}/students/{student}/transactions` - Manual ledger
/// entries of a student.
async fn student_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<transactions::Model>>> {
    visible_student(&state, &auth, school_id, student_id).await?;
    let filter = TransactionFilter {
        student_id: Some(student_id),
        ..TransactionFilter::default()
    };
    let rows = TransactionRepository::new(state.conn())
        .list(school_id, &filter, &page)
        .await?;
    Ok(Json(rows.into()))
}

/// GET `/schools/{school}/students/{student}/payment-summary` - Fees owed
/// and paid.
async fn payment_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((school_id, student_id)): Path<(Uuid, Uuid)>,
    Query(period): Query<PeriodQuery>,
) -> ApiResult<Json<PaymentSummaryResponse>> {
    visible_student(&state, &auth, school_id, student_id).await?;
    let balance = ReportRepository::new(state.conn(), &state.settings.fee_marker)
        .payment_summary(school_id, student_id, period.into())
        .await?;

    Ok(Json(PaymentSummaryResponse {
        student_id,
        outstanding: balance.outstanding(),
        total_paid: balance.total_paid,
        total_fees: balance.total_fees,
        balance: balance.balance,
        payment_count: balance.payment_count,
        last_payment: balance.last_payment,
    }))
}

