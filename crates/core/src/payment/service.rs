//! Payment amount conversion, references and verification decisions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;
use uuid::Uuid;

use super::types::{PaymentStatus, VerifyAction};

/// Errors from payment calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// Amount must be positive.
    #[error("payment amount must be greater than zero")]
    NonPositiveAmount,

    /// Amount has more precision than minor units allow.
    #[error("payment amount has more than two decimal places")]
    TooPrecise,

    /// Amount does not fit the gateway's integer range.
    #[error("payment amount is too large")]
    TooLarge,
}

/// Payment lifecycle rules.
pub struct PaymentService;

impl PaymentService {
    /// Converts a major-unit amount to minor units (x100).
    pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount);
        }
        let minor = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(PaymentError::TooLarge)?;
        if minor.fract() != Decimal::ZERO {
            return Err(PaymentError::TooPrecise);
        }
        minor.to_i64().ok_or(PaymentError::TooLarge)
    }

    /// Converts minor units back to a major-unit amount.
    #[must_use]
    pub fn from_minor_units(minor: i64) -> Decimal {
        Decimal::new(minor, 2)
    }

    /// Builds a payment reference of the form `PAY_{unix}_{12 hex}`.
    #[must_use]
    pub fn generate_reference(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("PAY_{}_{}", now.timestamp(), &suffix[..12])
    }

    /// Decides how to reconcile a local row with the gateway's answer.
    ///
    /// A successful row is never touched again, so repeated verification
    /// cannot duplicate or double count a payment.
    #[must_use]
    pub fn decide(existing: Option<PaymentStatus>, gateway_success: bool) -> VerifyAction {
        match (existing, gateway_success) {
            (Some(PaymentStatus::Success), _) => VerifyAction::AlreadySettled,
            (Some(_), true) => VerifyAction::MarkSuccess,
            (None, true) => VerifyAction::CreateSuccess,
            (Some(PaymentStatus::Pending), false) => VerifyAction::MarkFailed,
            (Some(PaymentStatus::Failed) | None, false) => VerifyAction::Reject,
        }
    }
}
