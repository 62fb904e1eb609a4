//! Fee resolution.

use rust_decimal::Decimal;
use scholaris_shared::types::{ClassId, SectionId, StudentId};

use super::error::FeeError;
use super::types::{FeeRule, FeeScope, FeeScopeKind, MAX_AMOUNT, PeriodFilter, StudentProfile};

/// Resolves which fees apply to students.
pub struct FeeResolver;

impl FeeResolver {
    /// Returns the fees charged to the student within the period.
    pub fn applicable<'a>(
        fees: &'a [FeeRule],
        student: &'a StudentProfile,
        period: PeriodFilter,
    ) -> impl Iterator<Item = &'a FeeRule> + 'a {
        fees.iter().filter(move |fee| {
            fee.applies_to(student) && period.matches(Some(fee.session_id), Some(fee.term_id))
        })
    }

    /// Sums the fees charged to the student within the period.
    #[must_use]
    pub fn total_for(fees: &[FeeRule], student: &StudentProfile, period: PeriodFilter) -> Decimal {
        Self::applicable(fees, student, period)
            .map(|fee| fee.amount)
            .sum()
    }

    /// Validates the scope columns of a new or edited fee.
    ///
    /// Unlike [`FeeScope::from_columns`], missing keys are an input error here.
    pub fn scope_for_input(
        kind: FeeScopeKind,
        section_id: SectionId,
        class_id: Option<ClassId>,
        student_id: Option<StudentId>,
    ) -> Result<FeeScope, FeeError> {
        match (kind, class_id, student_id) {
            (FeeScopeKind::School, _, _) => Ok(FeeScope::School),
            (FeeScopeKind::Section, _, _) => Ok(FeeScope::Section(section_id)),
            (FeeScopeKind::Class, Some(class_id), _) => Ok(FeeScope::Class(class_id)),
            (FeeScopeKind::Class, None, _) => Err(FeeError::MissingClass),
            (FeeScopeKind::Student, _, Some(student_id)) => Ok(FeeScope::Student(student_id)),
            (FeeScopeKind::Student, _, None) => Err(FeeError::MissingStudent),
        }
    }

    /// Validates a fee amount.
    pub fn validate_amount(amount: Decimal) -> Result<(), FeeError> {
        if amount <= Decimal::ZERO {
            return Err(FeeError::NonPositiveAmount);
        }
        if amount > MAX_AMOUNT {
            return Err(FeeError::AmountTooLarge);
        }
        Ok(())
    }
}
