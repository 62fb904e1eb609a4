//! Fee error types.

use thiserror::Error;

/// Fee definition errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeError {
    /// A class fee needs a class.
    #[error("class_id is required for class-scoped fees")]
    MissingClass,

    /// A student fee needs a student.
    #[error("student_id is required for student-scoped fees")]
    MissingStudent,

    /// Amount must be positive.
    #[error("fee amount must be greater than zero")]
    NonPositiveAmount,

    /// Amount does not fit a money column.
    #[error("fee amount must not exceed 9999999999.99")]
    AmountTooLarge,
}
