//! Entity re-exports.

pub use super::academic_sessions::Entity as AcademicSessions;
pub use super::attendances::Entity as Attendances;
pub use super::classes::Entity as Classes;
pub use super::exam_results::Entity as ExamResults;
pub use super::exams::Entity as Exams;
pub use super::fees::Entity as Fees;
pub use super::homeworks::Entity as Homeworks;
pub use super::lesson_plans::Entity as LessonPlans;
pub use super::messages::Entity as Messages;
pub use super::notifications::Entity as Notifications;
pub use super::payments::Entity as Payments;
pub use super::schools::Entity as Schools;
pub use super::section_students::Entity as SectionStudents;
pub use super::sections::Entity as Sections;
pub use super::students::Entity as Students;
pub use super::subjects::Entity as Subjects;
pub use super::syllabuses::Entity as Syllabuses;
pub use super::terms::Entity as Terms;
pub use super::timetables::Entity as Timetables;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
