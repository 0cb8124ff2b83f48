//! Payroll cycle aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceDay, AttendanceStatus, MonthlySummary, PayrollCycle};

/// Folds an employee's rows for one cycle into a [`MonthlySummary`].
///
/// Rows of other employees and dates outside the cycle are ignored; if a date
/// appears twice the later row wins. Cycle dates with no row count as absent
/// and are reported in `missing_days`.
///
/// | Status | Counts towards |
/// |--------|----------------|
/// | Present | present 1 |
/// | HalfPresent | present 0.5, absent 0.5 |
/// | Absent | absent 1 |
/// | Leave | leave 1, absent 1 |
/// | WeeklyOff | weekly off 1 (worked weekly off too with a check-in) |
/// | Holiday | holiday 1 |
///
/// # Errors
///
/// Returns [`EngineError::AggregationInconsistency`] if the categories do not
/// add up to the cycle length.
pub fn aggregate_cycle(
    employee_id: &str,
    cycle: PayrollCycle,
    days: &[AttendanceDay],
    computed_at: DateTime<Utc>,
) -> EngineResult<MonthlySummary> {
    let half = Decimal::new(5, 1);
    let rows: BTreeMap<NaiveDate, &AttendanceDay> = days
        .iter()
        .filter(|d| d.employee_id == employee_id && cycle.contains(d.date))
        .map(|d| (d.date, d))
        .collect();

    let mut present = Decimal::ZERO;
    let mut absent = Decimal::ZERO;
    let mut leave = Decimal::ZERO;
    let mut weekly_off = Decimal::ZERO;
    let mut holiday = Decimal::ZERO;
    let mut worked_weekly_off = Decimal::ZERO;

    for day in rows.values() {
        match day.status {
            AttendanceStatus::Present => present += Decimal::ONE,
            AttendanceStatus::HalfPresent => {
                present += half;
                absent += half;
            }
            AttendanceStatus::Absent => absent += Decimal::ONE,
            AttendanceStatus::Leave => {
                leave += Decimal::ONE;
                absent += Decimal::ONE;
            }
            AttendanceStatus::WeeklyOff => {
                weekly_off += Decimal::ONE;
                if day.has_check_in() {
                    worked_weekly_off += Decimal::ONE;
                }
            }
            AttendanceStatus::Holiday => holiday += Decimal::ONE,
        }
    }

    let total_days = cycle.total_days();
    let missing_days = total_days.saturating_sub(rows.len() as u32);
    absent += Decimal::from(missing_days);

    let summary = MonthlySummary {
        employee_id: employee_id.to_string(),
        cycle,
        total_present: present,
        total_absent: absent,
        total_leave_taken: leave,
        total_weekly_off: weekly_off,
        total_holiday: holiday,
        worked_weekly_off,
        missing_days,
        total_days,
        days_worked: present + weekly_off + holiday,
        computed_at,
    };

    if summary.accounted_days() != Decimal::from(total_days) {
        return Err(EngineError::AggregationInconsistency {
            employee_id: employee_id.to_string(),
            cycle: cycle.to_string(),
            message: format!(
                "categories sum to {} but the cycle has {} days",
                summary.accounted_days(),
                total_days
            ),
        });
    }

    debug!(
        employee_id,
        cycle = %cycle,
        present = %summary.total_present,
        absent = %summary.total_absent,
        missing_days,
        "Aggregated payroll cycle"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};

    fn day(date: NaiveDate, status: AttendanceStatus) -> AttendanceDay {
        let mut row = AttendanceDay::new("E001", date);
        row.status = status;
        row
    }

    fn full_cycle(cycle: PayrollCycle, status: AttendanceStatus) -> Vec<AttendanceDay> {
        cycle.dates().map(|d| day(d, status)).collect()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // ==========================================================================
    // AG-001: every status folds into the right buckets
    // ==========================================================================
    #[test]
    fn test_ag_001_status_fold() {
        let cycle = PayrollCycle::new(2025, 1).unwrap();
        let statuses = [
            AttendanceStatus::Present,
            AttendanceStatus::HalfPresent,
            AttendanceStatus::Absent,
            AttendanceStatus::Leave,
            AttendanceStatus::WeeklyOff,
            AttendanceStatus::Holiday,
        ];
        let mut days: Vec<AttendanceDay> = cycle
            .dates()
            .enumerate()
            .map(|(i, d)| day(d, statuses[i % statuses.len()]))
            .collect();
        days[4].time_in = NaiveTime::from_hms_opt(10, 0, 0);

        let summary = aggregate_cycle("E001", cycle, &days, Utc::now()).unwrap();

        // 31 days: statuses cycle five times plus one extra Present.
        assert_eq!(summary.total_days, 31);
        assert_eq!(summary.total_present, dec("8.5"));
        assert_eq!(summary.total_absent, dec("12.5"));
        assert_eq!(summary.total_leave_taken, dec("5"));
        assert_eq!(summary.total_weekly_off, dec("5"));
        assert_eq!(summary.total_holiday, dec("5"));
        assert_eq!(summary.worked_weekly_off, dec("1"));
        assert_eq!(summary.days_worked, dec("18.5"));
        assert_eq!(summary.missing_days, 0);
    }

    // ==========================================================================
    // AG-002: calendar length is independent of rows seen
    // ==========================================================================
    #[test]
    fn test_ag_002_missing_rows_count_as_absent() {
        let cycle = PayrollCycle::new(2025, 3).unwrap();
        let days: Vec<AttendanceDay> = cycle
            .dates()
            .take(10)
            .map(|d| day(d, AttendanceStatus::Present))
            .collect();

        let summary = aggregate_cycle("E001", cycle, &days, Utc::now()).unwrap();

        assert_eq!(summary.total_days, 28);
        assert_eq!(summary.missing_days, 18);
        assert_eq!(summary.total_absent, dec("18"));
        assert_eq!(summary.accounted_days(), dec("28"));
    }

    #[test]
    fn test_ag_003_foreign_rows_are_ignored() {
        let cycle = PayrollCycle::new(2025, 1).unwrap();
        let mut days = full_cycle(cycle, AttendanceStatus::Present);
        days.push(day(cycle.end_date() + Duration::days(1), AttendanceStatus::Absent));
        let mut other = day(cycle.start_date(), AttendanceStatus::Absent);
        other.employee_id = "E002".to_string();
        days.push(other);

        let summary = aggregate_cycle("E001", cycle, &days, Utc::now()).unwrap();

        assert_eq!(summary.total_present, dec("31"));
        assert_eq!(summary.total_absent, Decimal::ZERO);
        assert_eq!(summary.days_worked, dec("31"));
    }

    #[test]
    fn test_ag_004_duplicate_date_last_row_wins() {
        let cycle = PayrollCycle::new(2025, 1).unwrap();
        let mut days = full_cycle(cycle, AttendanceStatus::Present);
        days.push(day(cycle.start_date(), AttendanceStatus::Absent));

        let summary = aggregate_cycle("E001", cycle, &days, Utc::now()).unwrap();

        assert_eq!(summary.total_present, dec("30"));
        assert_eq!(summary.total_absent, dec("1"));
    }

    #[test]
    fn test_ag_005_empty_cycle_is_all_absent() {
        let cycle = PayrollCycle::new(2024, 3).unwrap();
        let summary = aggregate_cycle("E001", cycle, &[], Utc::now()).unwrap();
        assert_eq!(summary.total_days, 29);
        assert_eq!(summary.total_absent, dec("29"));
        assert_eq!(summary.days_worked, Decimal::ZERO);
    }
}
