//! Lesson plan review workflow.
//!
//! Authors move their plans between `draft` and `submitted` and may rework a
//! rejected plan. Reviewers approve or reject submitted plans. An approved
//! plan is final.

use serde::{Deserialize, Serialize};

use super::error::PlanningError;

/// Lesson plan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonPlanStatus {
    /// Being written.
    Draft,
    /// Awaiting review.
    Submitted,
    /// Accepted by a reviewer.
    Approved,
    /// Sent back with remarks.
    Rejected,
}

impl LessonPlanStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true if the plan's content may still change.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        !matches!(self, Self::Approved)
    }

    /// Checks a status change made by `actor` and returns the new status.
    pub fn transition(self, to: Self, actor: PlanActor) -> Result<Self, PlanningError> {
        use LessonPlanStatus::{Approved, Draft, Rejected, Submitted};

        if self == Approved {
            return Err(PlanningError::Locked);
        }
        if self == to {
            return Ok(to);
        }
        match (self, to) {
            (Draft, Submitted) | (Submitted, Draft) | (Rejected, Draft | Submitted) => {
                if actor.is_author {
                    Ok(to)
                } else {
                    Err(PlanningError::NotPermitted("the author"))
                }
            }
            (Submitted, Approved | Rejected) => {
                if actor.is_reviewer {
                    Ok(to)
                } else {
                    Err(PlanningError::NotPermitted("a reviewer"))
                }
            }
            (from, to) => Err(PlanningError::InvalidTransition { from, to }),
        }
    }

    /// Checks the remarks accompanying a move to `self`.
    pub fn check_remarks(self, remarks: Option<&str>) -> Result<(), PlanningError> {
        let blank = remarks.is_none_or(|r| r.trim().is_empty());
        if self == Self::Rejected && blank {
            return Err(PlanningError::RemarksRequired);
        }
        Ok(())
    }
}

impl std::fmt::Display for LessonPlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the caller relates to a lesson plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanActor {
    /// Wrote the plan.
    pub is_author: bool,
    /// May approve or reject plans.
    pub is_reviewer: bool,
}
