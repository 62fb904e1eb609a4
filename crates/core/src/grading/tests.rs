use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

#[rstest]
#[case(dec!(100), Grade::A)]
#[case(dec!(70), Grade::A)]
#[case(dec!(69.99), Grade::B)]
#[case(dec!(60), Grade::B)]
#[case(dec!(59.5), Grade::C)]
#[case(dec!(50), Grade::C)]
#[case(dec!(45), Grade::D)]
#[case(dec!(44.99), Grade::E)]
#[case(dec!(40), Grade::E)]
#[case(dec!(39.99), Grade::F)]
#[case(dec!(0), Grade::F)]
fn test_grade_boundaries(#[case] score: Decimal, #[case] expected: Grade) {
    assert_eq!(Grade::from_score(score), expected);
}

#[test]
fn test_validate_score() {
    assert!(validate_score(dec!(0), dec!(100)).is_ok());
    assert!(validate_score(dec!(100), dec!(100)).is_ok());
    assert!(validate_score(dec!(100.5), dec!(100)).is_err());
    assert!(validate_score(dec!(-1), dec!(100)).is_err());
}

#[test]
fn test_result_published_message() {
    assert_eq!(
        result_published_message("Ada Obi", "Mathematics"),
        "Exam result for 'Ada Obi' in 'Mathematics' has been published."
    );
    assert_eq!(Grade::B.to_string(), "B");
}

proptest! {
    /// A higher score never gives a worse grade.
    #[test]
    fn prop_grade_is_monotonic(a in 0i64..10_000, b in 0i64..10_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo = Grade::from_score(Decimal::new(lo, 2));
        let hi = Grade::from_score(Decimal::new(hi, 2));
        // Grade::A sorts first.
        prop_assert!(hi <= lo);
    }
}
