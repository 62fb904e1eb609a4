//! Attendance statuses and summaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Attendance mark for one student on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// In class.
    Present,
    /// Not in class.
    Absent,
    /// Arrived late.
    Late,
    /// Absent with permission.
    Excused,
}

impl AttendanceStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        }
    }
}

/// Attendance counts for a group of students on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    /// Students expected.
    pub total_students: u64,
    /// Marked present.
    pub present_count: u64,
    /// Marked absent.
    pub absent_count: u64,
    /// Marked late.
    pub late_count: u64,
    /// Marked excused.
    pub excused_count: u64,
    /// Students with any mark.
    pub recorded_count: u64,
    /// Present share of expected students, two decimals.
    pub percentage_present: Decimal,
}

impl AttendanceSummary {
    /// Summarises the recorded statuses against the expected head count.
    #[must_use]
    pub fn from_statuses<I>(total_students: u64, statuses: I) -> Self
    where
        I: IntoIterator<Item = AttendanceStatus>,
    {
        let mut summary = Self {
            total_students,
            ..Self::default()
        };
        for status in statuses {
            summary.recorded_count += 1;
            match status {
                AttendanceStatus::Present => summary.present_count += 1,
                AttendanceStatus::Absent => summary.absent_count += 1,
                AttendanceStatus::Late => summary.late_count += 1,
                AttendanceStatus::Excused => summary.excused_count += 1,
            }
        }
        if total_students > 0 {
            summary.percentage_present = (Decimal::from(summary.present_count)
                * Decimal::ONE_HUNDRED
                / Decimal::from(total_students))
            .round_dp(2);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_counts() {
        let summary = AttendanceSummary::from_statuses(
            3,
            [
                AttendanceStatus::Present,
                AttendanceStatus::Late,
                AttendanceStatus::Present,
            ],
        );
        assert_eq!(summary.present_count, 2);
        assert_eq!(summary.late_count, 1);
        assert_eq!(summary.recorded_count, 3);
        assert_eq!(summary.percentage_present, dec!(66.67));
    }

    #[test]
    fn test_empty_group() {
        let summary = AttendanceSummary::from_statuses(0, []);
        assert_eq!(summary.percentage_present, dec!(0));
        assert_eq!(summary.recorded_count, 0);
    }
}
