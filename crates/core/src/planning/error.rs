//! Planning error types.

use thiserror::Error;

use super::lesson_plan::LessonPlanStatus;

/// Errors from planning rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanningError {
    /// The requested status change is not part of the workflow.
    #[error("cannot move a lesson plan from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: LessonPlanStatus,
        /// Requested status.
        to: LessonPlanStatus,
    },

    /// The caller may not make this status change.
    #[error("only {0} may make this change")]
    NotPermitted(&'static str),

    /// Approved plans are final.
    #[error("approved lesson plans cannot be changed")]
    Locked,

    /// A rejection must say why.
    #[error("remarks are required when rejecting a lesson plan")]
    RemarksRequired,

    /// A slot must end after it starts.
    #[error("end_time must be after start_time")]
    EndBeforeStart,

    /// Homework cannot be due before it is set.
    #[error("due_date cannot be before the day the homework was set")]
    DueBeforeAssigned,
}
