//! Balance calculation.

use rust_decimal::Decimal;

use super::types::{CollectionSummary, StudentBalance};
use crate::fees::{FeeResolver, FeeRule, PeriodFilter, StudentProfile};
use crate::ledger::{GatewayReceipt, ManualReceipt, PaidTotals, PaymentLedger};

/// Combines fee resolution with the payment ledger.
#[derive(Debug, Clone)]
pub struct BalanceCalculator {
    ledger: PaymentLedger,
}

impl BalanceCalculator {
    /// Creates a calculator recognising fee income by `fee_marker`.
    #[must_use]
    pub fn new(fee_marker: &str) -> Self {
        Self {
            ledger: PaymentLedger::new(fee_marker),
        }
    }

    /// Returns the underlying ledger.
    #[must_use]
    pub const fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    /// Balance of a single student.
    #[must_use]
    pub fn student_balance(
        &self,
        student: &StudentProfile,
        fees: &[FeeRule],
        manual: &[ManualReceipt],
        gateway: &[GatewayReceipt],
        period: PeriodFilter,
    ) -> StudentBalance {
        let total_fees = FeeResolver::total_for(fees, student, period);
        let paid = self.ledger.totals_for(student.id, manual, gateway, period);
        build(student, total_fees, &paid)
    }

    /// Balances of every given student, computed from one pass over the receipts.
    #[must_use]
    pub fn balances(
        &self,
        students: &[StudentProfile],
        fees: &[FeeRule],
        manual: &[ManualReceipt],
        gateway: &[GatewayReceipt],
        period: PeriodFilter,
    ) -> Vec<StudentBalance> {
        let paid = self.ledger.totals_by_student(manual, gateway, period);
        let none = PaidTotals::default();
        students
            .iter()
            .map(|student| {
                let total_fees = FeeResolver::total_for(fees, student, period);
                build(student, total_fees, paid.get(&student.id).unwrap_or(&none))
            })
            .collect()
    }

    /// Students whose balance is positive.
    #[must_use]
    pub fn debtors(
        &self,
        students: &[StudentProfile],
        fees: &[FeeRule],
        manual: &[ManualReceipt],
        gateway: &[GatewayReceipt],
    ) -> Vec<StudentBalance> {
        self.balances(students, fees, manual, gateway, PeriodFilter::ALL)
            .into_iter()
            .filter(StudentBalance::is_debtor)
            .collect()
    }

    /// Collection figures for a cohort of students.
    ///
    /// Both sides cover the same students: receipts of students outside
    /// `students`, and income booked without a student, are not collected.
    #[must_use]
    pub fn collection_summary(
        &self,
        students: &[StudentProfile],
        fees: &[FeeRule],
        manual: &[ManualReceipt],
        gateway: &[GatewayReceipt],
    ) -> CollectionSummary {
        let balances = self.balances(students, fees, manual, gateway, PeriodFilter::ALL);
        let expected: Decimal = balances.iter().map(|b| b.total_fees).sum();
        let collected: Decimal = balances.iter().map(|b| b.total_paid).sum();

        CollectionSummary {
            collected,
            outstanding: (expected - collected).max(Decimal::ZERO),
            expected,
        }
    }
}

fn build(student: &StudentProfile, total_fees: Decimal, paid: &PaidTotals) -> StudentBalance {
    let total_paid = paid.total();
    StudentBalance {
        student_id: student.id,
        total_fees,
        total_paid,
        balance: total_fees - total_paid,
        payment_count: paid.payment_count,
        last_payment: paid.last_payment,
    }
}
