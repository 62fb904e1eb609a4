//! Fee scope resolution.
//!
//! A fee is charged to a student when it is active, belongs to the student's
//! school, and its [`FeeScope`] matches the student.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod scope_props;
#[cfg(test)]
mod tests;

pub use error::FeeError;
pub use service::FeeResolver;
pub use types::{FeeRule, FeeScope, FeeScopeKind, MAX_AMOUNT, PeriodFilter, StudentProfile};
