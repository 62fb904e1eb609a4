//! Property-based tests for balances and debtor detection.

use proptest::prelude::*;
use rust_decimal::Decimal;
use scholaris_shared::types::{
    AcademicSessionId, ClassId, FeeId, SchoolId, SectionId, StudentId, TermId,
};

use super::BalanceCalculator;
use crate::fees::{FeeRule, FeeScope, PeriodFilter, StudentProfile};
use crate::ledger::GatewayReceipt;
use crate::payment::PaymentStatus;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A student is a debtor exactly when fees exceed payments.
    #[test]
    fn prop_debtor_iff_positive_balance(fee_amount in amount(), paid in amount()) {
        let school = SchoolId::new();
        let student = StudentProfile {
            id: StudentId::new(),
            school_id: school,
            class_id: Some(ClassId::new()),
            section_ids: vec![SectionId::new()],
        };
        let fees = vec![FeeRule {
            id: FeeId::new(),
            school_id: school,
            session_id: AcademicSessionId::new(),
            term_id: TermId::new(),
            amount: fee_amount,
            scope: FeeScope::School,
            is_active: true,
        }];
        let gateway = vec![GatewayReceipt {
            student_id: student.id,
            status: PaymentStatus::Success,
            amount: paid,
            session_id: None,
            term_id: None,
            paid_at: None,
        }];
        let calc = BalanceCalculator::new("Fee");

        let balance = calc.student_balance(&student, &fees, &[], &gateway, PeriodFilter::ALL);
        prop_assert_eq!(balance.balance, fee_amount - paid);
        prop_assert!(balance.outstanding() >= Decimal::ZERO);

        let debtors = calc.debtors(std::slice::from_ref(&student), &fees, &[], &gateway);
        prop_assert_eq!(!debtors.is_empty(), fee_amount > paid);
    }

    /// Pending and failed payments never reduce a balance.
    #[test]
    fn prop_unsettled_payments_ignored(fee_amount in amount(), paid in amount(), failed in any::<bool>()) {
        let school = SchoolId::new();
        let student = StudentProfile {
            id: StudentId::new(),
            school_id: school,
            class_id: None,
            section_ids: vec![],
        };
        let fees = vec![FeeRule {
            id: FeeId::new(),
            school_id: school,
            session_id: AcademicSessionId::new(),
            term_id: TermId::new(),
            amount: fee_amount,
            scope: FeeScope::Student(student.id),
            is_active: true,
        }];
        let status = if failed { PaymentStatus::Failed } else { PaymentStatus::Pending };
        let gateway = vec![GatewayReceipt {
            student_id: student.id,
            status,
            amount: paid,
            session_id: None,
            term_id: None,
            paid_at: None,
        }];

        let balance = BalanceCalculator::new("Fee")
            .student_balance(&student, &fees, &[], &gateway, PeriodFilter::ALL);
        prop_assert_eq!(balance.total_paid, Decimal::ZERO);
        prop_assert_eq!(balance.balance, fee_amount);
    }
}
