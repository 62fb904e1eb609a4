//! Registration IDs and admission numbers.
//!
//! IDs look like `AIA-TCHR-007`: school short code, role prefix, and a
//! counter padded to at least three digits.

use thiserror::Error;

use crate::auth::UserRole;


/// Prefix used for student admission numbers.
pub const STUDENT_PREFIX: &str = "STU";

/// Short code errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortCodeError {
    /// Short code is empty after trimming.
    #[error("short code must not be empty")]
    Empty,

    /// Short code has characters other than ASCII letters and digits.
    #[error("short code may only contain letters and digits")]
    InvalidCharacters,

    /// Short code is longer than allowed.
    #[error("short code must be at most {0} characters")]
    TooLong(usize),
}

/// Maximum short code length.
pub const MAX_SHORT_CODE_LEN: usize = 10;

/// Trims and upper-cases a short code, rejecting unusable values.
pub fn normalize_short_code(raw: &str) -> Result<String, ShortCodeError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(ShortCodeError::Empty);
    }
    if code.len() > MAX_SHORT_CODE_LEN {
        return Err(ShortCodeError::TooLong(MAX_SHORT_CODE_LEN));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ShortCodeError::InvalidCharacters);
    }
    Ok(code)
}

/// Role prefix for staff and parent registration IDs.
#[must_use]
pub const fn role_prefix(role: UserRole) -> &'static str {
    match role {
        UserRole::Proprietor => "PROP",
        UserRole::Principal => "PRIN",
        UserRole::Bursar => "BURS",
        UserRole::Teacher => "TCHR",
        UserRole::Parent => "PRNT",
        UserRole::Admin => "USER",
    }
}

/// The text every ID of this school and prefix starts with, e.g. `AIA-TCHR-`.
#[must_use]
pub fn id_stem(short_code: &str, prefix: &str) -> String {
    format!("{short_code}-{prefix}-")
}

/// Formats an ID.
#[must_use]
pub fn format_id(short_code: &str, prefix: &str, number: u32) -> String {
    format!("{short_code}-{prefix}-{number:03}")
}

/// Next counter value after the existing IDs that share `stem`.
///
/// IDs whose suffix is not a number are ignored.
pub fn next_number<'a, I>(stem: &str, existing: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(stem))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Next ID for a school and prefix given the IDs already issued.
pub fn next_id<'a, I>(short_code: &str, prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let stem = id_stem(short_code, prefix);
    format_id(short_code, prefix, next_number(&stem, existing))
}

/// Rewrites the leading `OLD-` of an ID to `NEW-`.
///
/// Returns `None` when the ID does not start with the old code.
#[must_use]
pub fn rename_prefix(id: &str, old_code: &str, new_code: &str) -> Option<String> {
    id.strip_prefix(old_code)
        .and_then(|rest| rest.strip_prefix('-'))
        .map(|rest| format!("{new_code}-{rest}"))
}
