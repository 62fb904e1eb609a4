//! Balance result types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use scholaris_shared::types::StudentId;

/// Fee position of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentBalance {
    /// Student ID.
    pub student_id: StudentId,
    /// Sum of applicable fees.
    pub total_fees: Decimal,
    /// Sum of counted receipts.
    pub total_paid: Decimal,
    /// `total_fees - total_paid`, negative when overpaid.
    pub balance: Decimal,
    /// Number of counted receipts.
    pub payment_count: u64,
    /// Latest counted receipt.
    pub last_payment: Option<DateTime<Utc>>,
}

impl StudentBalance {
    /// Amount still owed, never negative.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        self.balance.max(Decimal::ZERO)
    }

    /// Returns true if the student owes money.
    #[must_use]
    pub fn is_debtor(&self) -> bool {
        self.balance > Decimal::ZERO
    }
}

/// School-wide fee collection figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    /// Received through both channels from the same students.
    pub collected: Decimal,
    /// `expected - collected`, never negative.
    pub outstanding: Decimal,
    /// Fees charged to active students.
    pub expected: Decimal,
}
