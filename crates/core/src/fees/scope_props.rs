//! Property-based tests for fee scope resolution.

use proptest::prelude::*;
use rust_decimal::Decimal;
use scholaris_shared::types::{
    AcademicSessionId, ClassId, FeeId, SchoolId, SectionId, StudentId, TermId,
};

use super::{FeeResolver, FeeRule, FeeScope, PeriodFilter, StudentProfile};

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn school_fee(school_id: SchoolId, amount: Decimal) -> FeeRule {
    FeeRule {
        id: FeeId::new(),
        school_id,
        session_id: AcademicSessionId::new(),
        term_id: TermId::new(),
        amount,
        scope: FeeScope::School,
        is_active: true,
    }
}

fn student_in(school_id: SchoolId, pool: &[ClassId], pick: usize) -> StudentProfile {
    StudentProfile {
        id: StudentId::new(),
        school_id,
        class_id: pool.get(pick % pool.len().max(1)).copied(),
        section_ids: vec![SectionId::new()],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A school-scope fee is charged exactly once to every student.
    #[test]
    fn prop_school_fee_counts_once_per_student(
        amounts in prop::collection::vec(amount(), 1..6),
        students in 1usize..20,
    ) {
        let school = SchoolId::new();
        let classes: Vec<ClassId> = (0..3).map(|_| ClassId::new()).collect();
        let fees: Vec<FeeRule> = amounts.iter().map(|a| school_fee(school, *a)).collect();
        let expected: Decimal = amounts.iter().copied().sum();

        for i in 0..students {
            let student = student_in(school, &classes, i);
            prop_assert_eq!(
                FeeResolver::applicable(&fees, &student, PeriodFilter::ALL).count(),
                fees.len()
            );
            prop_assert_eq!(FeeResolver::total_for(&fees, &student, PeriodFilter::ALL), expected);
        }
    }

    /// Fees of another school never apply.
    #[test]
    fn prop_other_school_fees_never_apply(amounts in prop::collection::vec(amount(), 0..6)) {
        let fees: Vec<FeeRule> = amounts.iter().map(|a| school_fee(SchoolId::new(), *a)).collect();
        let student = student_in(SchoolId::new(), &[], 0);

        prop_assert_eq!(FeeResolver::total_for(&fees, &student, PeriodFilter::ALL), Decimal::ZERO);
    }

    /// Class fees apply only to students of that class.
    #[test]
    fn prop_class_fee_matches_class_only(amount in amount(), pick in 0usize..4) {
        let school = SchoolId::new();
        let classes: Vec<ClassId> = (0..4).map(|_| ClassId::new()).collect();
        let target = classes[0];
        let mut fee = school_fee(school, amount);
        fee.scope = FeeScope::Class(target);

        let student = student_in(school, &classes, pick);
        let total = FeeResolver::total_for(&[fee], &student, PeriodFilter::ALL);

        if student.class_id == Some(target) {
            prop_assert_eq!(total, amount);
        } else {
            prop_assert_eq!(total, Decimal::ZERO);
        }
    }
}
