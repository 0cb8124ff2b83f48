//! Monthly (payroll-cycle) attendance summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayrollCycle;

/// Attendance counts for one employee over one payroll cycle.
///
/// Half days make the present/absent counts fractional, so all counts are
/// [`Decimal`]. The record is always replaced as a whole, keyed by
/// `(employee_id, cycle)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// The employee code.
    pub employee_id: String,
    /// The payroll cycle.
    pub cycle: PayrollCycle,
    /// Present days, half days counting 0.5.
    pub total_present: Decimal,
    /// Absent days, including leave and half days at 0.5.
    pub total_absent: Decimal,
    /// Leave days (also counted in `total_absent`).
    pub total_leave_taken: Decimal,
    /// Weekly off days.
    pub total_weekly_off: Decimal,
    /// Holidays.
    pub total_holiday: Decimal,
    /// Weekly off days with a recorded check-in (also counted in `total_weekly_off`).
    pub worked_weekly_off: Decimal,
    /// Calendar dates of the cycle with no attendance row (counted as absent).
    pub missing_days: u32,
    /// Calendar length of the cycle.
    pub total_days: u32,
    /// Paid days: present + weekly off + holiday.
    pub days_worked: Decimal,
    /// When the summary was computed.
    pub computed_at: DateTime<Utc>,
}

impl MonthlySummary {
    /// Sum of the four mutually exclusive categories.
    pub fn accounted_days(&self) -> Decimal {
        self.total_present + self.total_absent + self.total_weekly_off + self.total_holiday
    }
}
