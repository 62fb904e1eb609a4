use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scholaris_shared::types::{
    AcademicSessionId, ClassId, FeeId, SchoolId, SectionId, StudentId, TermId,
};

use super::*;
use crate::fees::{FeeRule, FeeScope, PeriodFilter, StudentProfile};
use crate::ledger::{GatewayReceipt, ManualReceipt, TransactionType};
use crate::payment::PaymentStatus;

fn student(school: SchoolId, class: ClassId) -> StudentProfile {
    StudentProfile {
        id: StudentId::new(),
        school_id: school,
        class_id: Some(class),
        section_ids: vec![SectionId::new()],
    }
}

fn fee(school: SchoolId, scope: FeeScope, amount: Decimal) -> FeeRule {
    FeeRule {
        id: FeeId::new(),
        school_id: school,
        session_id: AcademicSessionId::new(),
        term_id: TermId::new(),
        amount,
        scope,
        is_active: true,
    }
}

fn cash(student: StudentId, amount: Decimal) -> ManualReceipt {
    ManualReceipt {
        student_id: Some(student),
        transaction_type: TransactionType::Income,
        category: Some("School Fee".into()),
        amount,
        payment_id: None,
        session_id: None,
        term_id: None,
        transaction_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
    }
}

fn online(student: StudentId, amount: Decimal) -> GatewayReceipt {
    GatewayReceipt {
        student_id: student,
        status: PaymentStatus::Success,
        amount,
        session_id: None,
        term_id: None,
        paid_at: None,
    }
}

#[test]
fn test_partial_payment_is_a_debtor() {
    let school = SchoolId::new();
    let class = ClassId::new();
    let s = student(school, class);
    let fees = vec![fee(school, FeeScope::Class(class), dec!(100000))];
    let calc = BalanceCalculator::new("Fee");

    let debtors = calc.debtors(std::slice::from_ref(&s), &fees, &[cash(s.id, dec!(50000))], &[]);
    assert_eq!(debtors.len(), 1);
    assert_eq!(debtors[0].balance, dec!(50000));
}

#[test]
fn test_fully_paid_is_not_a_debtor() {
    let school = SchoolId::new();
    let class = ClassId::new();
    let s = student(school, class);
    let fees = vec![fee(school, FeeScope::Class(class), dec!(100000))];
    let calc = BalanceCalculator::new("Fee");

    let debtors = calc.debtors(
        std::slice::from_ref(&s),
        &fees,
        &[cash(s.id, dec!(40000))],
        &[online(s.id, dec!(60000))],
    );
    assert!(debtors.is_empty());
}

#[test]
fn test_overpayment_gives_negative_balance_and_zero_outstanding() {
    let school = SchoolId::new();
    let s = student(school, ClassId::new());
    let calc = BalanceCalculator::new("Fee");

    let balance = calc.student_balance(&s, &[], &[cash(s.id, dec!(500))], &[], PeriodFilter::ALL);
    assert_eq!(balance.total_fees, dec!(0));
    assert_eq!(balance.balance, dec!(-500));
    assert_eq!(balance.outstanding(), dec!(0));
    assert!(!balance.is_debtor());
}

#[test]
fn test_class_plus_school_fee_balance() {
    let school = SchoolId::new();
    let class = ClassId::new();
    let s = student(school, class);
    let fees = vec![
        fee(school, FeeScope::Class(class), dec!(50000)),
        fee(school, FeeScope::School, dec!(10000)),
    ];
    let calc = BalanceCalculator::new("Fee");

    let balance = calc.student_balance(&s, &fees, &[], &[], PeriodFilter::ALL);
    assert_eq!(balance.total_fees, dec!(60000));
    assert_eq!(balance.outstanding(), dec!(60000));
}

#[test]
fn test_balances_match_single_student_computation() {
    let school = SchoolId::new();
    let class = ClassId::new();
    let students: Vec<StudentProfile> = (0..5).map(|_| student(school, class)).collect();
    let fees = vec![
        fee(school, FeeScope::School, dec!(1000)),
        fee(school, FeeScope::Student(students[2].id), dec!(250)),
    ];
    let manual = vec![cash(students[0].id, dec!(1000)), cash(students[1].id, dec!(300))];
    let gateway = vec![online(students[2].id, dec!(100))];
    let calc = BalanceCalculator::new("Fee");

    let batch = calc.balances(&students, &fees, &manual, &gateway, PeriodFilter::ALL);
    for (student, row) in students.iter().zip(&batch) {
        let single = calc.student_balance(student, &fees, &manual, &gateway, PeriodFilter::ALL);
        assert_eq!(&single, row);
    }
}

#[test]
fn test_collection_summary() {
    let school = SchoolId::new();
    let class = ClassId::new();
    let a = student(school, class);
    let b = student(school, class);
    let fees = vec![fee(school, FeeScope::Class(class), dec!(1000))];
    let manual = vec![cash(a.id, dec!(400))];
    let gateway = vec![online(b.id, dec!(100))];
    let calc = BalanceCalculator::new("Fee");

    let summary = calc.collection_summary(&[a, b], &fees, &manual, &gateway);
    assert_eq!(summary.expected, dec!(2000));
    assert_eq!(summary.collected, dec!(500));
    assert_eq!(summary.outstanding, dec!(1500));
}

#[test]
fn test_collection_ignores_receipts_outside_cohort() {
    let school = SchoolId::new();
    let class = ClassId::new();
    let active = student(school, class);
    let departed = student(school, class);
    let fees = vec![fee(school, FeeScope::Class(class), dec!(1000))];
    let mut walk_in = cash(active.id, dec!(75));
    walk_in.student_id = None;
    let manual = vec![cash(active.id, dec!(300)), cash(departed.id, dec!(500)), walk_in];
    let gateway = vec![online(departed.id, dec!(200))];
    let calc = BalanceCalculator::new("Fee");

    let summary = calc.collection_summary(&[active], &fees, &manual, &gateway);
    assert_eq!(summary.expected, dec!(1000));
    assert_eq!(summary.collected, dec!(300));
    assert_eq!(summary.outstanding, dec!(700));
}

#[test]
fn test_collection_outstanding_is_clamped() {
    let school = SchoolId::new();
    let s = student(school, ClassId::new());
    let calc = BalanceCalculator::new("Fee");

    let summary = calc.collection_summary(&[s.clone()], &[], &[cash(s.id, dec!(10))], &[]);
    assert_eq!(summary.outstanding, dec!(0));
    assert_eq!(summary.collected, dec!(10));
}
