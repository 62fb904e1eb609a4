use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

#[rstest]
#[case(dec!(150.00), 15000)]
#[case(dec!(0.01), 1)]
#[case(dec!(100000), 10_000_000)]
fn test_to_minor_units(#[case] amount: Decimal, #[case] expected: i64) {
    assert_eq!(PaymentService::to_minor_units(amount), Ok(expected));
}

#[test]
fn test_to_minor_units_rejects_bad_amounts() {
    assert_eq!(
        PaymentService::to_minor_units(dec!(0)),
        Err(PaymentError::NonPositiveAmount)
    );
    assert_eq!(
        PaymentService::to_minor_units(dec!(1.005)),
        Err(PaymentError::TooPrecise)
    );
}

#[test]
fn test_to_minor_units_rejects_overflowing_amounts() {
    assert_eq!(
        PaymentService::to_minor_units(Decimal::MAX),
        Err(PaymentError::TooLarge)
    );
    // Fits a decimal after scaling but not an i64.
    assert_eq!(
        PaymentService::to_minor_units(Decimal::from(100_000_000_000_000_000_i64)),
        Err(PaymentError::TooLarge)
    );
}

#[test]
fn test_reference_format() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let reference = PaymentService::generate_reference(now);
    let parts: Vec<&str> = reference.split('_').collect();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "PAY");
    assert_eq!(parts[1], now.timestamp().to_string());
    assert_eq!(parts[2].len(), 12);
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(reference, PaymentService::generate_reference(now));
}

#[rstest]
#[case(Some(PaymentStatus::Pending), true, VerifyAction::MarkSuccess)]
#[case(Some(PaymentStatus::Failed), true, VerifyAction::MarkSuccess)]
#[case(Some(PaymentStatus::Success), true, VerifyAction::AlreadySettled)]
#[case(Some(PaymentStatus::Success), false, VerifyAction::AlreadySettled)]
#[case(None, true, VerifyAction::CreateSuccess)]
#[case(Some(PaymentStatus::Pending), false, VerifyAction::MarkFailed)]
#[case(None, false, VerifyAction::Reject)]
fn test_decide(
    #[case] existing: Option<PaymentStatus>,
    #[case] success: bool,
    #[case] expected: VerifyAction,
) {
    assert_eq!(PaymentService::decide(existing, success), expected);
}

#[test]
fn test_status_parse() {
    assert_eq!("success".parse::<PaymentStatus>(), Ok(PaymentStatus::Success));
    assert!("refunded".parse::<PaymentStatus>().is_err());
    assert!(PaymentStatus::Success.is_final());
    assert!(!PaymentStatus::Pending.is_final());
}

proptest! {
    /// Converting to minor units and back is lossless for two-decimal amounts.
    #[test]
    fn prop_minor_units_lossless(cents in 1i64..1_000_000_000_000i64) {
        let amount = Decimal::new(cents, 2);
        let minor = PaymentService::to_minor_units(amount).unwrap();
        prop_assert_eq!(minor, cents);
        prop_assert_eq!(PaymentService::from_minor_units(minor), amount);
    }

    /// Verifying a settled payment again never changes it.
    #[test]
    fn prop_second_verification_is_noop(gateway_success in any::<bool>()) {
        let first = PaymentService::decide(None, true);
        prop_assert_eq!(first, VerifyAction::CreateSuccess);
        prop_assert_eq!(
            PaymentService::decide(Some(PaymentStatus::Success), gateway_success),
            VerifyAction::AlreadySettled
        );
    }
}
