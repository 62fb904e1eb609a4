//! Aggregation of paid amounts.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use scholaris_shared::types::StudentId;

use super::types::{GatewayReceipt, ManualReceipt, PaidTotals, TransactionType};
use crate::fees::PeriodFilter;
use crate::payment::PaymentStatus;

/// Sums receipts from the manual and gateway channels.
///
/// A manual income entry counts as a fee payment when its category contains
/// the fee marker (case-insensitive) and it is not linked to a gateway
/// payment. Linked entries are covered by the gateway channel.
#[derive(Debug, Clone)]
pub struct PaymentLedger {
    marker: String,
}

impl PaymentLedger {
    /// Creates a ledger that recognises fee income by `marker`.
    #[must_use]
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_lowercase(),
        }
    }

    /// Returns true if the category marks fee income.
    #[must_use]
    pub fn is_fee_category(&self, category: Option<&str>) -> bool {
        category.is_some_and(|c| c.to_lowercase().contains(&self.marker))
    }

    /// Returns true if the manual receipt counts towards fees paid.
    #[must_use]
    pub fn counts_manual(&self, receipt: &ManualReceipt, period: PeriodFilter) -> bool {
        receipt.transaction_type == TransactionType::Income
            && receipt.payment_id.is_none()
            && self.is_fee_category(receipt.category.as_deref())
            && period.matches(receipt.session_id, receipt.term_id)
    }

    /// Returns true if the gateway receipt counts towards fees paid.
    #[must_use]
    pub fn counts_gateway(receipt: &GatewayReceipt, period: PeriodFilter) -> bool {
        receipt.status == PaymentStatus::Success && period.matches(receipt.session_id, receipt.term_id)
    }

    /// Totals for one student.
    #[must_use]
    pub fn totals_for(
        &self,
        student_id: StudentId,
        manual: &[ManualReceipt],
        gateway: &[GatewayReceipt],
        period: PeriodFilter,
    ) -> PaidTotals {
        let mut totals = PaidTotals::default();
        for receipt in manual
            .iter()
            .filter(|r| r.student_id == Some(student_id))
        {
            self.add_manual(&mut totals, receipt, period);
        }
        for receipt in gateway.iter().filter(|r| r.student_id == student_id) {
            Self::add_gateway(&mut totals, receipt, period);
        }
        totals
    }

    /// Totals for every student that has at least one counted receipt.
    ///
    /// Single pass over each channel.
    #[must_use]
    pub fn totals_by_student(
        &self,
        manual: &[ManualReceipt],
        gateway: &[GatewayReceipt],
        period: PeriodFilter,
    ) -> HashMap<StudentId, PaidTotals> {
        let mut by_student: HashMap<StudentId, PaidTotals> = HashMap::new();
        for receipt in manual {
            if let Some(student_id) = receipt.student_id
                && self.counts_manual(receipt, period)
            {
                self.add_manual(by_student.entry(student_id).or_default(), receipt, period);
            }
        }
        for receipt in gateway {
            if Self::counts_gateway(receipt, period) {
                Self::add_gateway(by_student.entry(receipt.student_id).or_default(), receipt, period);
            }
        }
        by_student
    }

    fn add_manual(&self, totals: &mut PaidTotals, receipt: &ManualReceipt, period: PeriodFilter) {
        if !self.counts_manual(receipt, period) {
            return;
        }
        totals.manual += receipt.amount;
        totals.payment_count += 1;
        let booked = receipt.transaction_date.and_time(NaiveTime::MIN).and_utc();
        bump_last(totals, booked);
    }

    fn add_gateway(totals: &mut PaidTotals, receipt: &GatewayReceipt, period: PeriodFilter) {
        if !Self::counts_gateway(receipt, period) {
            return;
        }
        totals.gateway += receipt.amount;
        totals.payment_count += 1;
        if let Some(paid_at) = receipt.paid_at {
            bump_last(totals, paid_at);
        }
    }
}

fn bump_last(totals: &mut PaidTotals, at: DateTime<Utc>) {
    if totals.last_payment.is_none_or(|last| at > last) {
        totals.last_payment = Some(at);
    }
}
