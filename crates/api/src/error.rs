//! HTTP error responses.
//!
//! Every handler returns [`ApiResult`]. Repository and domain errors convert
//! into [`ApiError`], which renders `{ "error", "message", "fields"? }` with
//! the status code of the underlying [`AppError`].

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scholaris_core::auth::PasswordError;
use scholaris_core::fees::FeeError;
use scholaris_core::payment::{GatewayError, PaymentError};
use scholaris_core::planning::PlanningError;
use scholaris_core::registration::ShortCodeError;
use scholaris_db::{
    AcademicError, AttendanceError, ClassError, ExamError, FeeRepoError, HomeworkError,
    LessonPlanError, MessageError, NotificationError, PaymentRepoError, ReportError,
    SchoolError, SectionError, StudentError, SubjectError, SyllabusError, TimetableError,
    TransactionError, UserError,
};
use scholaris_shared::{AppError, JwtError};
use sea_orm::DbErr;
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Field name to messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// An error rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    fields: Option<FieldErrors>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

impl ApiError {
    /// Wraps an application error.
    #[must_use]
    pub const fn new(error: AppError) -> Self {
        Self {
            error,
            fields: None,
        }
    }

    /// A 422 carrying messages for individual fields.
    #[must_use]
    pub fn fields(message: impl Into<String>, fields: FieldErrors) -> Self {
        Self {
            error: AppError::Validation(message.into()),
            fields: Some(fields),
        }
    }

    /// A 422 for a single field.
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.clone()]);
        Self::fields(message, fields)
    }

    /// 404 with a message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AppError::NotFound(message.into()))
    }

    /// 403 with a message.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(AppError::Forbidden(message.into()))
    }

    /// 401 with a message.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(AppError::Unauthorized(message.into()))
    }

    /// 400 with a message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(AppError::BadRequest(message.into()))
    }

    /// The underlying application error.
    #[must_use]
    pub const fn app_error(&self) -> &AppError {
        &self.error
    }

    /// HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.error.is_internal() {
            tracing::error!(error = %self.error, "Request failed");
            "An internal error occurred".to_string()
        } else {
            message_of(&self.error)
        };

        let body = ErrorBody {
            error: self.error.error_code(),
            message,
            fields: self.fields.as_ref(),
        };
        (status, Json(body)).into_response()
    }
}

fn message_of(error: &AppError) -> String {
    match error {
        AppError::Unauthorized(m)
        | AppError::Forbidden(m)
        | AppError::NotFound(m)
        | AppError::Validation(m)
        | AppError::BadRequest(m)
        | AppError::BusinessRule(m)
        | AppError::Conflict(m)
        | AppError::Gateway(m)
        | AppError::Database(m)
        | AppError::ExternalService(m)
        | AppError::Internal(m) => m.clone(),
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(error)
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::new(AppError::Database(e.to_string()))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        flatten_validation(&errors, "", &mut fields);
        Self::fields("The given data was invalid.", fields)
    }
}

fn flatten_validation(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(path).or_default();
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| format!("{field} is invalid ({})", error.code), ToString::to_string);
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => Self::unauthorized("Token has expired"),
            JwtError::DecodingError(_) => Self::unauthorized("Invalid or malformed token"),
            JwtError::EncodingError(msg) => Self::new(AppError::Internal(msg)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        Self::new(AppError::Internal(e.to_string()))
    }
}

impl From<ShortCodeError> for ApiError {
    fn from(e: ShortCodeError) -> Self {
        Self::field("short_code", e.to_string())
    }
}

impl From<FeeError> for ApiError {
    fn from(e: FeeError) -> Self {
        let field = match e {
            FeeError::MissingClass => "class_id",
            FeeError::MissingStudent => "student_id",
            FeeError::NonPositiveAmount | FeeError::AmountTooLarge => "amount",
        };
        Self::field(field, e.to_string())
    }
}

impl From<PaymentError> for ApiError {
    fn from(e: PaymentError) -> Self {
        Self::field("amount", e.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Rejected(msg) => Self::new(AppError::Gateway(msg)),
            GatewayError::Transport(_) | GatewayError::InvalidResponse(_) => {
                Self::new(AppError::ExternalService(e.to_string()))
            }
        }
    }
}

impl From<SchoolError> for ApiError {
    fn from(e: SchoolError) -> Self {
        match e {
            SchoolError::NotFound(_) => Self::not_found(e.to_string()),
            SchoolError::DuplicateShortCode(_) | SchoolError::DuplicateEmail(_) => {
                Self::new(AppError::Conflict(e.to_string()))
            }
            SchoolError::Database(db) => db.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(_) | UserError::SchoolNotFound(_) => Self::not_found(e.to_string()),
            UserError::DuplicateEmail(_) => Self::new(AppError::Conflict(e.to_string())),
            UserError::RegistrationIdExhausted(_) => Self::new(AppError::Internal(e.to_string())),
            UserError::Database(db) => db.into(),
        }
    }
}

impl From<SectionError> for ApiError {
    fn from(e: SectionError) -> Self {
        match e {
            SectionError::NotFound(_) => Self::not_found(e.to_string()),
            SectionError::HasClasses(_) => Self::new(AppError::BusinessRule(e.to_string())),
            SectionError::Database(db) => db.into(),
        }
    }
}

impl From<ClassError> for ApiError {
    fn from(e: ClassError) -> Self {
        match e {
            ClassError::NotFound(_) => Self::not_found(e.to_string()),
            ClassError::SectionNotFound(_) => Self::field("section_id", e.to_string()),
            ClassError::HasStudents(_) => Self::new(AppError::BusinessRule(e.to_string())),
            ClassError::Database(db) => db.into(),
        }
    }
}

impl From<AcademicError> for ApiError {
    fn from(e: AcademicError) -> Self {
        match e {
            AcademicError::SessionNotFound(_) | AcademicError::TermNotFound(_) => {
                Self::not_found(e.to_string())
            }
            AcademicError::SectionNotFound(_) => Self::field("section_id", e.to_string()),
            AcademicError::InvalidDateRange { .. } => Self::field("end_date", e.to_string()),
            AcademicError::HasTerms(_) => Self::new(AppError::BusinessRule(e.to_string())),
            AcademicError::Database(db) => db.into(),
        }
    }
}

impl From<SubjectError> for ApiError {
    fn from(e: SubjectError) -> Self {
        match e {
            SubjectError::NotFound(_) => Self::not_found(e.to_string()),
            SubjectError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            SubjectError::Database(db) => db.into(),
        }
    }
}

impl From<StudentError> for ApiError {
    fn from(e: StudentError) -> Self {
        match e {
            StudentError::NotFound(_) | StudentError::SchoolNotFound(_) => {
                Self::not_found(e.to_string())
            }
            StudentError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            StudentError::DuplicateAdmissionNumber(_) => {
                Self::new(AppError::Conflict(e.to_string()))
            }
            StudentError::AdmissionNumberExhausted(_) => {
                Self::new(AppError::Internal(e.to_string()))
            }
            StudentError::Database(db) => db.into(),
        }
    }
}

impl From<FeeRepoError> for ApiError {
    fn from(e: FeeRepoError) -> Self {
        match e {
            FeeRepoError::NotFound(_) => Self::not_found(e.to_string()),
            FeeRepoError::Invalid(fee) => fee.into(),
            FeeRepoError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            FeeRepoError::Database(db) => db.into(),
        }
    }
}

impl From<TransactionError> for ApiError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::NotFound(_) => Self::not_found(e.to_string()),
            TransactionError::NonPositiveAmount | TransactionError::AmountTooLarge => Self::field("amount", e.to_string()),
            TransactionError::InvalidPaymentLink { .. } => Self::field("payment_id", e.to_string()),
            TransactionError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            TransactionError::Database(db) => db.into(),
        }
    }
}

impl From<PaymentRepoError> for ApiError {
    fn from(e: PaymentRepoError) -> Self {
        match e {
            PaymentRepoError::NotFound(_) => Self::not_found(e.to_string()),
            PaymentRepoError::DuplicateReference(_) => Self::new(AppError::Conflict(e.to_string())),
            PaymentRepoError::Database(db) => db.into(),
        }
    }
}

impl From<ExamError> for ApiError {
    fn from(e: ExamError) -> Self {
        match e {
            ExamError::NotFound(_) => Self::not_found(e.to_string()),
            ExamError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            ExamError::InvalidMaxScore => Self::field("max_score", e.to_string()),
            ExamError::InvalidScore { .. } => Self::field("results", e.to_string()),
            ExamError::Database(db) => db.into(),
        }
    }
}

impl From<PlanningError> for ApiError {
    fn from(e: PlanningError) -> Self {
        match e {
            PlanningError::NotPermitted(_) => Self::forbidden(e.to_string()),
            PlanningError::RemarksRequired => Self::field("remarks", e.to_string()),
            PlanningError::EndBeforeStart => Self::field("end_time", e.to_string()),
            PlanningError::DueBeforeAssigned => Self::field("due_date", e.to_string()),
            PlanningError::Locked | PlanningError::InvalidTransition { .. } => {
                Self::new(AppError::BusinessRule(e.to_string()))
            }
        }
    }
}

impl From<LessonPlanError> for ApiError {
    fn from(e: LessonPlanError) -> Self {
        match e {
            LessonPlanError::NotFound(_) => Self::not_found(e.to_string()),
            LessonPlanError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            LessonPlanError::NotAuthor => Self::forbidden(e.to_string()),
            LessonPlanError::Planning(rule) => rule.into(),
            LessonPlanError::Database(db) => db.into(),
        }
    }
}

impl From<SyllabusError> for ApiError {
    fn from(e: SyllabusError) -> Self {
        match e {
            SyllabusError::NotFound(_) => Self::not_found(e.to_string()),
            SyllabusError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            SyllabusError::Database(db) => db.into(),
        }
    }
}

impl From<TimetableError> for ApiError {
    fn from(e: TimetableError) -> Self {
        match e {
            TimetableError::NotFound(_) => Self::not_found(e.to_string()),
            TimetableError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            TimetableError::ClassBusy(_) | TimetableError::TeacherBusy(_) => {
                Self::new(AppError::Conflict(e.to_string()))
            }
            TimetableError::Planning(rule) => rule.into(),
            TimetableError::Database(db) => db.into(),
        }
    }
}

impl From<HomeworkError> for ApiError {
    fn from(e: HomeworkError) -> Self {
        match e {
            HomeworkError::NotFound(_) => Self::not_found(e.to_string()),
            HomeworkError::InvalidReference(_) => Self::new(AppError::Validation(e.to_string())),
            HomeworkError::NotAuthor => Self::forbidden(e.to_string()),
            HomeworkError::Planning(rule) => rule.into(),
            HomeworkError::Database(db) => db.into(),
        }
    }
}

impl From<AttendanceError> for ApiError {
    fn from(e: AttendanceError) -> Self {
        match e {
            AttendanceError::ClassNotFound(_) => Self::not_found(e.to_string()),
            AttendanceError::StudentNotInClass(_) => Self::field("records", e.to_string()),
            AttendanceError::Database(db) => db.into(),
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::NotFound(_) => Self::not_found(e.to_string()),
            NotificationError::Database(db) => db.into(),
        }
    }
}

impl From<MessageError> for ApiError {
    fn from(e: MessageError) -> Self {
        match e {
            MessageError::NotFound(_) => Self::not_found(e.to_string()),
            MessageError::RecipientNotFound(_) | MessageError::SelfMessage => {
                Self::field("recipient_id", e.to_string())
            }
            MessageError::Database(db) => db.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::StudentNotFound(_) => Self::not_found(e.to_string()),
            ReportError::InvalidDateRange { .. } => Self::field("end_date", e.to_string()),
            ReportError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    #[test]
    fn test_validation_errors_become_field_messages() {
        let errors = Payload { name: String::new() }.validate().unwrap_err();
        let error = ApiError::from(errors);

        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let fields = error.fields.unwrap();
        assert_eq!(fields["name"], vec!["name is required".to_string()]);
    }

    #[test]
    fn test_gateway_rejection_is_bad_request() {
        let error = ApiError::from(GatewayError::Rejected("Declined".into()));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);

        let error = ApiError::from(GatewayError::Transport("timeout".into()));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_short_code_is_conflict() {
        let error = ApiError::from(SchoolError::DuplicateShortCode("AIA".into()));
        assert_eq!(error.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_class_fee_without_class_names_the_field() {
        let error = ApiError::from(FeeRepoError::Invalid(FeeError::MissingClass));
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error.fields.unwrap().contains_key("class_id"));
    }

    #[test]
    fn test_rejection_without_remarks_names_the_field() {
        let error = ApiError::from(LessonPlanError::Planning(PlanningError::RemarksRequired));
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error.fields.unwrap().contains_key("remarks"));
    }

    #[rstest]
    #[case(ApiError::from(SectionError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND)]
    #[case(ApiError::from(SectionError::HasClasses(Uuid::nil())), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ApiError::from(ClassError::HasStudents(Uuid::nil())), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ApiError::from(TimetableError::ClassBusy(Uuid::nil())), StatusCode::CONFLICT)]
    #[case(ApiError::from(TimetableError::TeacherBusy(Uuid::nil())), StatusCode::CONFLICT)]
    #[case(ApiError::from(LessonPlanError::NotAuthor), StatusCode::FORBIDDEN)]
    #[case(ApiError::from(LessonPlanError::Planning(PlanningError::Locked)), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ApiError::from(PlanningError::NotPermitted("a reviewer")), StatusCode::FORBIDDEN)]
    #[case(ApiError::from(DbErr::Custom("boom".into())), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_repository_errors_map_to_status(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.status(), expected);
    }
}
