//! The sandwich rule.
//!
//! A weekly off or holiday flanked by absence or leave on both sides is
//! treated as absent, and so are the flanking days. The rule reads each row's
//! underlying status ([`AttendanceDay::base_status`]) so re-running it over
//! rows it already converted gives the same answer; rows whose sandwich no
//! longer holds are released back to their pre-conversion status.
//!
//! Missing neighbor rows never complete a sandwich.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::models::{AttendanceDay, Timeline};

/// Returns true if the sandwich condition holds with `anchor` in the middle.
pub fn sandwich_holds(timeline: &Timeline, anchor: NaiveDate) -> bool {
    let Some(day) = timeline.get(&anchor) else {
        return false;
    };
    if day.is_locked() || !day.base_status().is_non_working() {
        return false;
    }

    let absent = |date: Option<NaiveDate>| {
        date.and_then(|d| timeline.get(&d))
            .is_some_and(|n| n.base_status().is_absence())
    };
    absent(anchor.pred_opt()) && absent(anchor.succ_opt())
}

/// Re-evaluates the rule for every row a change on `date` can affect.
///
/// Anchors `date - 1 ..= date + 1` are re-checked, which settles the rows
/// `date - 2 ..= date + 2`. Returns the dates whose status changed.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::recheck_sandwich;
/// use attendance_engine::models::{AttendanceDay, AttendanceStatus, Timeline};
/// use chrono::NaiveDate;
///
/// let sat = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
/// let sun = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
/// let mon = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
///
/// let mut timeline = Timeline::new();
/// for (date, status) in [
///     (sat, AttendanceStatus::Absent),
///     (sun, AttendanceStatus::WeeklyOff),
///     (mon, AttendanceStatus::Absent),
/// ] {
///     let mut day = AttendanceDay::new("E001", date);
///     day.classify(status);
///     timeline.insert(date, day);
/// }
///
/// assert_eq!(recheck_sandwich(&mut timeline, sun), vec![sun]);
/// assert_eq!(timeline[&sun].status, AttendanceStatus::Absent);
/// ```
pub fn recheck_sandwich(timeline: &mut Timeline, date: NaiveDate) -> Vec<NaiveDate> {
    let rows = (-2..=2).filter_map(|offset| date.checked_add_signed(Duration::days(offset)));
    settle(timeline, rows.collect())
}

/// Re-evaluates the rule for every row in the timeline.
pub fn apply_sandwich_rule(timeline: &mut Timeline) -> Vec<NaiveDate> {
    let rows = timeline.keys().copied().collect();
    settle(timeline, rows)
}

/// Re-evaluates the rule for every row in `from..=to`.
pub fn apply_sandwich_rule_between(
    timeline: &mut Timeline,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<NaiveDate> {
    if from > to {
        return Vec::new();
    }
    let rows = timeline.range(from..=to).map(|(date, _)| *date).collect();
    settle(timeline, rows)
}

fn covered(timeline: &Timeline, date: NaiveDate) -> bool {
    [date.pred_opt(), Some(date), date.succ_opt()]
        .into_iter()
        .flatten()
        .any(|anchor| sandwich_holds(timeline, anchor))
}

fn settle(timeline: &mut Timeline, rows: Vec<NaiveDate>) -> Vec<NaiveDate> {
    let decisions: Vec<(NaiveDate, bool)> = rows
        .into_iter()
        .filter(|date| timeline.contains_key(date))
        .map(|date| (date, covered(timeline, date)))
        .collect();

    let mut changed = Vec::new();
    for (date, hold) in decisions {
        let Some(day) = timeline.get_mut(&date) else {
            continue;
        };
        let moved = if hold {
            day.apply_sandwich()
        } else {
            day.release_sandwich()
        };
        if moved {
            log_change(day, hold);
            changed.push(date);
        }
    }
    changed
}

fn log_change(day: &AttendanceDay, applied: bool) {
    if applied {
        debug!(
            employee_id = %day.employee_id,
            date = %day.date,
            origin = ?day.sandwich_origin,
            "Sandwich rule converted day to absent"
        );
    } else {
        debug!(
            employee_id = %day.employee_id,
            date = %day.date,
            status = %day.status,
            "Sandwich rule released day"
        );
    }
}
