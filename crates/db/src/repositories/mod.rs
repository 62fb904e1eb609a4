//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every query is scoped to one school.

mod common;

pub mod academic;
pub mod attendance;
pub mod class;
pub mod exam;
pub mod fee;
pub mod homework;
pub mod lesson_plan;
pub mod message;
pub mod notification;
pub mod payment;
pub mod report;
pub mod school;
pub mod section;
pub mod student;
pub mod subject;
pub mod syllabus;
pub mod timetable;
pub mod transaction;
pub mod user;

pub use academic::{AcademicError, AcademicRepository, SessionInput, TermInput};
pub use attendance::{AttendanceError, AttendanceMark, AttendanceRepository};
pub use class::{ClassError, ClassInput, ClassRepository};
pub use common::{MAX_ID_ATTEMPTS, Page};
pub use exam::{ExamError, ExamFilter, ExamInput, ExamRepository, ResultInput};
pub use fee::{FeeFilter, FeeInput, FeeRepoError, FeeRepository, FeeSummary, ScopeTotal};
pub use homework::{HomeworkError, HomeworkFilter, HomeworkInput, HomeworkRepository};
pub use lesson_plan::{
    LessonPlanError, LessonPlanFilter, LessonPlanInput, LessonPlanRepository, LessonPlanReview,
};
pub use message::{MessageError, MessageRepository, SendMessageInput};
pub use notification::{NewNotification, NotificationError, NotificationRepository};
pub use payment::{
    DEFAULT_GATEWAY_METHOD, NewPayment, PaymentFilter, PaymentRepoError, PaymentRepository,
};
pub use report::{
    CategoryTotal, DebtorRow, FinancialSummary, MethodTotal, NOT_ASSIGNED, ReportCard,
    ReportCardEntry, ReportError, ReportRepository,
};
pub use school::{
    OnboardSchoolInput, SchoolError, SchoolRepository, SchoolUpdate, UpdateSchoolInput,
};
pub use section::{SectionError, SectionInput, SectionRepository};
pub use student::{
    CreateStudentInput, ImportOutcome, ImportRowError, StudentError, StudentFilter,
    StudentRepository, StudentWithSections, UpdateStudentInput,
};
pub use subject::{SubjectError, SubjectInput, SubjectRepository};
pub use syllabus::{SyllabusError, SyllabusFilter, SyllabusInput, SyllabusRepository};
pub use timetable::{TimetableError, TimetableFilter, TimetableInput, TimetableRepository};
pub use transaction::{
    TransactionError, TransactionFilter, TransactionInput, TransactionRepository,
    TransactionStats,
};
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserFilter, UserRepository};
