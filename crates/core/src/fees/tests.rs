//! Unit tests for fee resolution.

use rust_decimal_macros::dec;
use scholaris_shared::types::{
    AcademicSessionId, ClassId, FeeId, SchoolId, SectionId, StudentId, TermId,
};

use super::*;

struct Fixture {
    school: SchoolId,
    section: SectionId,
    class: ClassId,
    session: AcademicSessionId,
    term: TermId,
}

impl Fixture {
    fn new() -> Self {
        Self {
            school: SchoolId::new(),
            section: SectionId::new(),
            class: ClassId::new(),
            session: AcademicSessionId::new(),
            term: TermId::new(),
        }
    }

    fn fee(&self, scope: FeeScope, amount: rust_decimal::Decimal) -> FeeRule {
        FeeRule {
            id: FeeId::new(),
            school_id: self.school,
            session_id: self.session,
            term_id: self.term,
            amount,
            scope,
            is_active: true,
        }
    }

    fn student(&self, class_id: Option<ClassId>, sections: Vec<SectionId>) -> StudentProfile {
        StudentProfile {
            id: StudentId::new(),
            school_id: self.school,
            class_id,
            section_ids: sections,
        }
    }
}

#[test]
fn test_no_fees_means_zero_total() {
    let fx = Fixture::new();
    let student = fx.student(Some(fx.class), vec![fx.section]);

    assert_eq!(FeeResolver::total_for(&[], &student, PeriodFilter::ALL), dec!(0));
}

#[test]
fn test_class_and_school_fees_add_up() {
    let fx = Fixture::new();
    let student = fx.student(Some(fx.class), vec![]);
    let fees = vec![
        fx.fee(FeeScope::Class(fx.class), dec!(50000)),
        fx.fee(FeeScope::School, dec!(10000)),
    ];

    assert_eq!(
        FeeResolver::total_for(&fees, &student, PeriodFilter::ALL),
        dec!(60000)
    );
}

#[test]
fn test_section_fee_requires_membership() {
    let fx = Fixture::new();
    let fees = vec![fx.fee(FeeScope::Section(fx.section), dec!(2500))];

    let member = fx.student(None, vec![fx.section]);
    let outsider = fx.student(None, vec![SectionId::new()]);

    assert_eq!(FeeResolver::total_for(&fees, &member, PeriodFilter::ALL), dec!(2500));
    assert_eq!(FeeResolver::total_for(&fees, &outsider, PeriodFilter::ALL), dec!(0));
}

#[test]
fn test_student_fee_is_additive() {
    let fx = Fixture::new();
    let student = fx.student(Some(fx.class), vec![]);
    let other = fx.student(Some(fx.class), vec![]);
    let fees = vec![
        fx.fee(FeeScope::Class(fx.class), dec!(1000)),
        fx.fee(FeeScope::Student(student.id), dec!(300)),
    ];

    assert_eq!(FeeResolver::total_for(&fees, &student, PeriodFilter::ALL), dec!(1300));
    assert_eq!(FeeResolver::total_for(&fees, &other, PeriodFilter::ALL), dec!(1000));
}

#[test]
fn test_inactive_and_foreign_fees_are_ignored() {
    let fx = Fixture::new();
    let student = fx.student(Some(fx.class), vec![]);

    let mut inactive = fx.fee(FeeScope::School, dec!(100));
    inactive.is_active = false;
    let mut foreign = fx.fee(FeeScope::School, dec!(200));
    foreign.school_id = SchoolId::new();

    assert_eq!(
        FeeResolver::total_for(&[inactive, foreign], &student, PeriodFilter::ALL),
        dec!(0)
    );
}

#[test]
fn test_period_filter() {
    let fx = Fixture::new();
    let student = fx.student(None, vec![]);
    let mut other_term = fx.fee(FeeScope::School, dec!(40));
    other_term.term_id = TermId::new();
    let fees = vec![fx.fee(FeeScope::School, dec!(60)), other_term];

    let this_term = PeriodFilter {
        session_id: Some(fx.session),
        term_id: Some(fx.term),
    };
    assert_eq!(FeeResolver::total_for(&fees, &student, this_term), dec!(60));
    assert_eq!(FeeResolver::total_for(&fees, &student, PeriodFilter::ALL), dec!(100));
}

#[test]
fn test_malformed_rows_convert_to_none() {
    let section = SectionId::new();
    assert_eq!(
        FeeScope::from_columns(FeeScopeKind::Class, section, None, None),
        None
    );
    assert_eq!(
        FeeScope::from_columns(FeeScopeKind::Student, section, Some(ClassId::new()), None),
        None
    );
    assert_eq!(
        FeeScope::from_columns(FeeScopeKind::Section, section, None, None),
        Some(FeeScope::Section(section))
    );
}

#[test]
fn test_scope_for_input_requires_keys() {
    let section = SectionId::new();
    assert_eq!(
        FeeResolver::scope_for_input(FeeScopeKind::Class, section, None, None),
        Err(FeeError::MissingClass)
    );
    assert_eq!(
        FeeResolver::scope_for_input(FeeScopeKind::Student, section, None, None),
        Err(FeeError::MissingStudent)
    );
    assert_eq!(
        FeeResolver::scope_for_input(FeeScopeKind::School, section, None, None),
        Ok(FeeScope::School)
    );
}

#[test]
fn test_scope_kind_parse() {
    assert_eq!("class".parse::<FeeScopeKind>(), Ok(FeeScopeKind::Class));
    assert!("district".parse::<FeeScopeKind>().is_err());
    assert_eq!(FeeScope::Student(StudentId::new()).kind(), FeeScopeKind::Student);
}

#[test]
fn test_validate_amount() {
    assert!(FeeResolver::validate_amount(dec!(0.01)).is_ok());
    assert_eq!(
        FeeResolver::validate_amount(dec!(0)),
        Err(FeeError::NonPositiveAmount)
    );
    assert!(FeeResolver::validate_amount(MAX_AMOUNT).is_ok());
    assert_eq!(
        FeeResolver::validate_amount(dec!(10000000000)),
        Err(FeeError::AmountTooLarge)
    );
    assert_eq!(
        FeeResolver::validate_amount(rust_decimal::Decimal::MAX),
        Err(FeeError::AmountTooLarge)
    );
}

#[test]
fn test_max_amount_matches_column_limit() {
    assert_eq!(MAX_AMOUNT, dec!(9999999999.99));
}
