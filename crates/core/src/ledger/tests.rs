use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scholaris_shared::types::{PaymentId, StudentId};

use super::*;
use crate::fees::PeriodFilter;
use crate::payment::PaymentStatus;

fn manual(student: StudentId, category: &str, amount: Decimal) -> ManualReceipt {
    ManualReceipt {
        student_id: Some(student),
        transaction_type: TransactionType::Income,
        category: Some(category.to_string()),
        amount,
        payment_id: None,
        session_id: None,
        term_id: None,
        transaction_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
    }
}

fn gateway(student: StudentId, status: PaymentStatus, amount: Decimal) -> GatewayReceipt {
    GatewayReceipt {
        student_id: student,
        status,
        amount,
        session_id: None,
        term_id: None,
        paid_at: Some(Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()),
    }
}

#[test]
fn test_fee_category_is_case_insensitive_substring() {
    let ledger = PaymentLedger::new("Fee");
    assert!(ledger.is_fee_category(Some("School Fee")));
    assert!(ledger.is_fee_category(Some("exam fees")));
    assert!(!ledger.is_fee_category(Some("Donation")));
    assert!(!ledger.is_fee_category(None));
}

#[test]
fn test_totals_sum_both_channels() {
    let ledger = PaymentLedger::new("Fee");
    let student = StudentId::new();
    let manual_rows = vec![
        manual(student, "School Fee", dec!(20000)),
        manual(student, "Uniform sale", dec!(5000)),
    ];
    let gateway_rows = vec![
        gateway(student, PaymentStatus::Success, dec!(30000)),
        gateway(student, PaymentStatus::Pending, dec!(99999)),
        gateway(student, PaymentStatus::Failed, dec!(99999)),
    ];

    let totals = ledger.totals_for(student, &manual_rows, &gateway_rows, PeriodFilter::ALL);
    assert_eq!(totals.manual, dec!(20000));
    assert_eq!(totals.gateway, dec!(30000));
    assert_eq!(totals.total(), dec!(50000));
    assert_eq!(totals.payment_count, 2);
    assert_eq!(
        totals.last_payment,
        Some(Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap())
    );
}

#[test]
fn test_expense_is_not_a_payment() {
    let ledger = PaymentLedger::new("Fee");
    let student = StudentId::new();
    let mut row = manual(student, "Fee refund", dec!(100));
    row.transaction_type = TransactionType::Expense;

    assert_eq!(
        ledger.totals_for(student, &[row], &[], PeriodFilter::ALL).total(),
        Decimal::ZERO
    );
}

#[test]
fn test_linked_manual_entry_is_not_double_counted() {
    let ledger = PaymentLedger::new("Fee");
    let student = StudentId::new();
    let mut mirror = manual(student, "School Fee", dec!(30000));
    mirror.payment_id = Some(PaymentId::new());
    let online = gateway(student, PaymentStatus::Success, dec!(30000));

    let totals = ledger.totals_for(student, &[mirror], &[online], PeriodFilter::ALL);
    assert_eq!(totals.total(), dec!(30000));
    assert_eq!(totals.payment_count, 1);
}

#[test]
fn test_totals_by_student_groups_rows() {
    let ledger = PaymentLedger::new("Fee");
    let a = StudentId::new();
    let b = StudentId::new();
    let manual_rows = vec![manual(a, "Fee", dec!(10)), manual(b, "Fee", dec!(5))];
    let gateway_rows = vec![gateway(a, PaymentStatus::Success, dec!(7))];

    let grouped = ledger.totals_by_student(&manual_rows, &gateway_rows, PeriodFilter::ALL);
    assert_eq!(grouped[&a].total(), dec!(17));
    assert_eq!(grouped[&b].total(), dec!(5));
    assert_eq!(grouped.len(), 2);
}

#[test]
fn test_linked_manual_rows_are_not_counted() {
    let ledger = PaymentLedger::new("fee");
    let student = StudentId::new();
    let mut linked = manual(student, "School Fee", dec!(40));
    linked.payment_id = Some(PaymentId::new());
    let rows = vec![manual(student, "School Fee", dec!(60)), linked];

    let grouped = ledger.totals_by_student(&rows, &[], PeriodFilter::ALL);
    assert_eq!(grouped[&student].total(), dec!(60));
    assert_eq!(grouped[&student].payment_count, 1);
}
