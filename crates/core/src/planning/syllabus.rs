//! Syllabus coverage status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How far a syllabus topic has been taught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyllabusStatus {
    /// Not started.
    Pending,
    /// Being taught.
    InProgress,
    /// Fully covered.
    Completed,
}

impl SyllabusStatus {
    /// Completion date to store for this status.
    ///
    /// Completed topics keep the given date or fall back to `today`; other
    /// statuses carry no completion date.
    #[must_use]
    pub fn completion_date(self, requested: Option<NaiveDate>, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Completed => Some(requested.unwrap_or(today)),
            Self::Pending | Self::InProgress => None,
        }
    }
}
