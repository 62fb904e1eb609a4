//! Teaching oversight: lesson plans, syllabus coverage, timetables and homework.
//!
//! Lesson plans move through a review workflow, syllabus topics carry a
//! coverage status, and timetable slots may not overlap for the same class
//! or teacher on the same day.

pub mod error;
pub mod homework;
pub mod lesson_plan;
pub mod syllabus;
pub mod timetable;

#[cfg(test)]
mod tests;

pub use error::PlanningError;
pub use homework::check_due_date;
pub use lesson_plan::{LessonPlanStatus, PlanActor};
pub use syllabus::SyllabusStatus;
pub use timetable::{Clash, ScheduledSlot, TimeSlot, Weekday};
