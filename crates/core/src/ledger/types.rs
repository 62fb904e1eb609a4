//! Receipt types for the two payment channels.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use scholaris_shared::types::{AcademicSessionId, PaymentId, StudentId, TermId};

use crate::payment::PaymentStatus;

/// Direction of a manual transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

/// How a manual transaction was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the bursary.
    Cash,
    /// Direct bank transfer.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Mobile money wallet.
    MobileMoney,
}

impl PaymentMethod {
    /// All methods, in display order.
    pub const ALL: [Self; 4] = [Self::Cash, Self::BankTransfer, Self::Cheque, Self::MobileMoney];

    /// Returns the storage string for this method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::MobileMoney => "mobile_money",
        }
    }
}

/// A manually recorded transaction as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualReceipt {
    /// Student the transaction is recorded against, if any.
    pub student_id: Option<StudentId>,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Free-form category, e.g. "School Fee".
    pub category: Option<String>,
    /// Amount.
    pub amount: Decimal,
    /// Gateway payment this entry mirrors, if any.
    pub payment_id: Option<PaymentId>,
    /// Session the transaction is booked in.
    pub session_id: Option<AcademicSessionId>,
    /// Term the transaction is booked in.
    pub term_id: Option<TermId>,
    /// Booking date.
    pub transaction_date: NaiveDate,
}

/// A gateway payment as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    /// Paying student.
    pub student_id: StudentId,
    /// Gateway status.
    pub status: PaymentStatus,
    /// Amount in major units.
    pub amount: Decimal,
    /// Session of the fee that was paid.
    pub session_id: Option<AcademicSessionId>,
    /// Term of the fee that was paid.
    pub term_id: Option<TermId>,
    /// Settlement time.
    pub paid_at: Option<DateTime<Utc>>,
}

/// Paid totals for one student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaidTotals {
    /// Sum of fee income recorded manually.
    pub manual: Decimal,
    /// Sum of successful gateway payments.
    pub gateway: Decimal,
    /// Number of counted receipts across both channels.
    pub payment_count: u64,
    /// Most recent counted receipt.
    pub last_payment: Option<DateTime<Utc>>,
}

impl PaidTotals {
    /// Total paid across both channels.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.manual + self.gateway
    }
}
