//! Homework rules.

use chrono::NaiveDate;

use super::error::PlanningError;

/// Checks that homework set on `assigned_on` is not due earlier.
pub fn check_due_date(assigned_on: NaiveDate, due_date: NaiveDate) -> Result<(), PlanningError> {
    if due_date < assigned_on {
        return Err(PlanningError::DueBeforeAssigned);
    }
    Ok(())
}
