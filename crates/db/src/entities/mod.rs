//! `SeaORM` entity definitions.

#![allow(missing_docs)]

pub mod prelude;

pub mod academic_sessions;
pub mod attendances;
pub mod classes;
pub mod exam_results;
pub mod exams;
pub mod fees;
pub mod homeworks;
pub mod lesson_plans;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod schools;
pub mod sea_orm_active_enums;
pub mod section_students;
pub mod sections;
pub mod students;
pub mod subjects;
pub mod syllabuses;
pub mod terms;
pub mod timetables;
pub mod transactions;
pub mod users;
