//! Approved leave: marking days and classifying paid/unpaid days per cycle.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::AttendancePolicy;
use crate::models::{
    AttendanceDay, AttendanceStatus, HolidayCalendar, LeaveClassification, LeaveRecord,
    PayrollCycle, Timeline,
};

/// Marks the working days of an approved leave as Leave.
///
/// Rows are created for dates that have none. Weekly offs and holidays, from
/// the row or from `policy`/`calendar` when no row exists, keep their status.
/// Manually modified rows are left alone. Returns the dates that changed.
pub fn apply_leave(
    timeline: &mut Timeline,
    leave: &LeaveRecord,
    policy: &AttendancePolicy,
    calendar: &HolidayCalendar,
) -> Vec<NaiveDate> {
    let mut changed = Vec::new();

    for date in leave.from.iter_days().take_while(|d| *d <= leave.to) {
        let scheduled_off = policy.is_weekly_off(date.weekday()) || calendar.is_holiday(date);
        if !timeline.contains_key(&date) {
            if scheduled_off {
                continue;
            }
            timeline.insert(date, AttendanceDay::new(leave.employee_id.clone(), date));
        }
        let Some(day) = timeline.get_mut(&date) else {
            continue;
        };

        if day.is_locked()
            || day.base_status().is_non_working()
            || day.base_status() == AttendanceStatus::Leave
        {
            continue;
        }
        if day.classify(AttendanceStatus::Leave) {
            changed.push(date);
        }
    }

    debug!(
        employee_id = %leave.employee_id,
        leave_type = %leave.leave_type,
        days = changed.len(),
        "Applied approved leave"
    );
    changed
}

/// Splits an employee's approved leave inside a cycle into paid and unpaid days.
///
/// Only working dates count: weekly offs and holidays inside a leave range
/// are already paid through `days_worked`. A record's `days` are allocated to
/// its working dates in date order, one day per date and the remainder on the
/// last, so a record spanning two cycles never contributes more than `days`
/// in total and a half-day leave contributes 0.5.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::classify_leave;
/// use attendance_engine::config::AttendancePolicy;
/// use attendance_engine::models::{HolidayCalendar, LeaveRecord, PayrollCycle};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let leave = LeaveRecord {
///     employee_id: "E001".to_string(),
///     leave_type: "annual".to_string(),
///     is_paid: true,
///     from: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
///     to: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
///     days: Decimal::from(2),
/// };
/// let cycle = PayrollCycle::new(2025, 1).unwrap();
/// let policy = AttendancePolicy::default();
///
/// let split = classify_leave("E001", cycle, &[leave], &policy, &HolidayCalendar::default());
/// assert_eq!(split.paid_days, Decimal::from(2));
/// assert_eq!(split.unpaid_days, Decimal::ZERO);
/// ```
pub fn classify_leave(
    employee_id: &str,
    cycle: PayrollCycle,
    leaves: &[LeaveRecord],
    policy: &AttendancePolicy,
    calendar: &HolidayCalendar,
) -> LeaveClassification {
    let mut split = LeaveClassification::default();

    for leave in leaves.iter().filter(|l| l.employee_id == employee_id) {
        if leave.from > cycle.end_date() || leave.to < cycle.start_date() {
            continue;
        }
        let mut remaining = leave.days.max(Decimal::ZERO);
        let mut days = Decimal::ZERO;

        let working = leave
            .from
            .iter_days()
            .take_while(|d| *d <= leave.to.min(cycle.end_date()))
            .filter(|d| !policy.is_weekly_off(d.weekday()) && !calendar.is_holiday(*d));
        for date in working {
            if remaining.is_zero() {
                break;
            }
            let portion = remaining.min(Decimal::ONE);
            remaining -= portion;
            if cycle.contains(date) {
                days += portion;
            }
        }

        if leave.is_paid {
            split.paid_days += days;
        } else {
            split.unpaid_days += days;
        }
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Holiday;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn leave(from: &str, to: &str, days: &str, is_paid: bool) -> LeaveRecord {
        LeaveRecord {
            employee_id: "E001".to_string(),
            leave_type: if is_paid { "annual" } else { "unpaid" }.to_string(),
            is_paid,
            from: d(from),
            to: d(to),
            days: days.parse().unwrap(),
        }
    }

    // ==========================================================================
    // LV-001: working days become Leave, offs stay
    // ==========================================================================
    #[test]
    fn test_lv_001_marks_working_days_only() {
        let policy = AttendancePolicy::default();
        let calendar = HolidayCalendar::from_holidays([Holiday {
            date: d("2025-01-14"),
            title: "Pongal".to_string(),
        }]);
        let mut timeline = Timeline::new();
        let mut present = AttendanceDay::new("E001", d("2025-01-10"));
        present.classify(AttendanceStatus::Present);
        timeline.insert(present.date, present);

        // Fri 10 Jan to Wed 15 Jan: Sun 12 is a weekly off, Tue 14 a holiday.
        let changed = apply_leave(
            &mut timeline,
            &leave("2025-01-10", "2025-01-15", "4", true),
            &policy,
            &calendar,
        );

        assert_eq!(
            changed,
            vec![d("2025-01-10"), d("2025-01-11"), d("2025-01-13"), d("2025-01-15")]
        );
        assert!(!timeline.contains_key(&d("2025-01-12")));
        assert!(!timeline.contains_key(&d("2025-01-14")));
        assert!(timeline.values().all(|day| day.status == AttendanceStatus::Leave));
    }

    #[test]
    fn test_lv_002_manual_and_existing_off_rows_are_kept() {
        let policy = AttendancePolicy::default();
        let mut timeline = Timeline::new();
        let mut locked = AttendanceDay::new("E001", d("2025-01-13"));
        locked.apply_manual_override(AttendanceStatus::Present, "came in", "hr", Utc::now());
        timeline.insert(locked.date, locked);
        let mut off = AttendanceDay::new("E001", d("2025-01-12"));
        off.classify(AttendanceStatus::WeeklyOff);
        timeline.insert(off.date, off);

        let changed = apply_leave(
            &mut timeline,
            &leave("2025-01-12", "2025-01-13", "1", true),
            &policy,
            &HolidayCalendar::default(),
        );

        assert!(changed.is_empty());
        assert_eq!(timeline[&d("2025-01-12")].status, AttendanceStatus::WeeklyOff);
        assert_eq!(timeline[&d("2025-01-13")].status, AttendanceStatus::Present);
    }

    #[test]
    fn test_lv_003_reapplying_is_a_no_op() {
        let policy = AttendancePolicy::default();
        let record = leave("2025-01-06", "2025-01-07", "2", false);
        let mut timeline = Timeline::new();
        apply_leave(&mut timeline, &record, &policy, &HolidayCalendar::default());
        let once = timeline.clone();

        let changed = apply_leave(&mut timeline, &record, &policy, &HolidayCalendar::default());

        assert!(changed.is_empty());
        assert_eq!(timeline, once);
    }

    // ==========================================================================
    // LV-010: paid/unpaid split per cycle
    // ==========================================================================
    #[test]
    fn test_lv_010_split_counts_working_days_only() {
        let policy = AttendancePolicy::default();
        let cycle = PayrollCycle::new(2025, 1).unwrap();
        let leaves = vec![
            // Sat 18 to Mon 20 in January; Sun 19 is a weekly off.
            leave("2025-01-18", "2025-01-23", "5", true),
            leave("2025-01-08", "2025-01-08", "0.5", false),
            leave("2025-01-02", "2025-01-03", "2", false),
        ];

        let split = classify_leave("E001", cycle, &leaves, &policy, &HolidayCalendar::default());

        assert_eq!(split.paid_days, Decimal::from(2));
        assert_eq!(split.unpaid_days, "2.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_lv_011_other_employees_and_cycles_ignored() {
        let policy = AttendancePolicy::default();
        let cycle = PayrollCycle::new(2025, 2).unwrap();
        let mut other = leave("2025-01-25", "2025-01-25", "1", true);
        other.employee_id = "E002".to_string();
        let leaves = vec![other, leave("2025-03-01", "2025-03-02", "2", true)];

        assert_eq!(
            classify_leave("E001", cycle, &leaves, &policy, &HolidayCalendar::default()),
            LeaveClassification::default()
        );
    }

    #[test]
    fn test_lv_012_leave_across_cycle_boundary_is_counted_once() {
        let policy = AttendancePolicy::default();
        let calendar = HolidayCalendar::default();
        let leaves = vec![leave("2025-01-18", "2025-01-23", "5", true)];

        let january =
            classify_leave("E001", PayrollCycle::new(2025, 1).unwrap(), &leaves, &policy, &calendar);
        let february =
            classify_leave("E001", PayrollCycle::new(2025, 2).unwrap(), &leaves, &policy, &calendar);

        assert_eq!(january.paid_days, Decimal::from(2));
        assert_eq!(february.paid_days, Decimal::from(3));
        assert_eq!(january.paid_days + february.paid_days, Decimal::from(5));
    }

    #[test]
    fn test_lv_013_short_approval_is_consumed_by_earlier_cycle() {
        let policy = AttendancePolicy::default();
        let calendar = HolidayCalendar::from_holidays([Holiday {
            date: d("2025-01-22"),
            title: "Founders Day".to_string(),
        }]);
        // Five working dates in range (22 Jan is a holiday), only 2.5 approved.
        let leaves = vec![leave("2025-01-17", "2025-01-24", "2.5", false)];

        let january =
            classify_leave("E001", PayrollCycle::new(2025, 1).unwrap(), &leaves, &policy, &calendar);
        let february =
            classify_leave("E001", PayrollCycle::new(2025, 2).unwrap(), &leaves, &policy, &calendar);

        assert_eq!(january.unpaid_days, "2.5".parse::<Decimal>().unwrap());
        assert_eq!(february.unpaid_days, Decimal::ZERO);
    }
}
