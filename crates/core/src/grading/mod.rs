//! Exam grading.
//!
//! Scores map to letter grades with fixed lower-inclusive thresholds:
//! 70 A, 60 B, 50 C, 45 D, 40 E, anything lower F.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// 70 and above.
    A,
    /// 60 to below 70.
    B,
    /// 50 to below 60.
    C,
    /// 45 to below 50.
    D,
    /// 40 to below 45.
    E,
    /// Below 40.
    F,
}

const THRESHOLDS: [(i64, Grade); 5] = [
    (70, Grade::A),
    (60, Grade::B),
    (50, Grade::C),
    (45, Grade::D),
    (40, Grade::E),
];

impl Grade {
    /// Grades a score.
    #[must_use]
    pub fn from_score(score: Decimal) -> Self {
        THRESHOLDS
            .iter()
            .find(|(min, _)| score >= Decimal::from(*min))
            .map_or(Self::F, |(_, grade)| *grade)
    }

    /// Returns the letter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grading errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradingError {
    /// Score outside `0..=max_score`.
    #[error("score {score} must be between 0 and {max_score}")]
    ScoreOutOfRange {
        /// Submitted score.
        score: Decimal,
        /// Exam maximum.
        max_score: Decimal,
    },
}

/// Checks that a score fits the exam.
pub fn validate_score(score: Decimal, max_score: Decimal) -> Result<(), GradingError> {
    if score < Decimal::ZERO || score > max_score {
        return Err(GradingError::ScoreOutOfRange { score, max_score });
    }
    Ok(())
}

/// Notification kind sent to parents when a result is published.
pub const RESULT_PUBLISHED_KIND: &str = "exam_result_published";

/// Notification title sent to parents when a result is published.
pub const RESULT_PUBLISHED_TITLE: &str = "New Exam Result Published";

/// Notification body for a published result.
#[must_use]
pub fn result_published_message(student_name: &str, subject_name: &str) -> String {
    format!("Exam result for '{student_name}' in '{subject_name}' has been published.")
}
