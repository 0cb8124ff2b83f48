//! Holiday apply and rollback on an employee's timeline.
//!
//! These functions only touch the holiday date itself. Callers re-run the
//! sandwich rule around the date afterwards (see [`super::recheck_sandwich`]).

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{AttendanceDay, AttendanceStatus, Timeline};

/// Marks `date` as a Holiday for one employee.
///
/// A missing row is created (so its original status is Absent). Manually
/// modified rows are left alone. A sandwich conversion on the date is undone
/// first so the holiday lands on the underlying status. Re-applying the same
/// holiday is a no-op.
///
/// Returns true if the row changed.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{apply_holiday, rollback_holiday};
/// use attendance_engine::models::{AttendanceStatus, Timeline};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
/// let mut timeline = Timeline::new();
///
/// assert!(apply_holiday("E001", &mut timeline, date));
/// assert!(!apply_holiday("E001", &mut timeline, date));
/// assert_eq!(timeline[&date].status, AttendanceStatus::Holiday);
///
/// assert!(rollback_holiday(&mut timeline, date));
/// assert_eq!(timeline[&date].status, AttendanceStatus::Absent);
/// ```
pub fn apply_holiday(employee_id: &str, timeline: &mut Timeline, date: NaiveDate) -> bool {
    let day = timeline
        .entry(date)
        .or_insert_with(|| AttendanceDay::new(employee_id, date));
    if day.is_locked() {
        debug!(employee_id, %date, "Holiday skipped for manually modified day");
        return false;
    }
    if day.base_status() == AttendanceStatus::Holiday {
        return false;
    }

    day.release_sandwich();
    let changed = day.transition_to(AttendanceStatus::Holiday);
    if changed {
        debug!(employee_id, %date, original = ?day.original_status, "Applied holiday");
    }
    changed
}

/// Restores the pre-holiday status of `date` for one employee.
///
/// Only unmodified rows whose underlying status is Holiday are touched; the
/// status returns to the captured original (Absent when none was captured).
///
/// Returns true if the row changed.
pub fn rollback_holiday(timeline: &mut Timeline, date: NaiveDate) -> bool {
    let Some(day) = timeline.get_mut(&date) else {
        return false;
    };
    if day.is_locked() || day.base_status() != AttendanceStatus::Holiday {
        return false;
    }

    day.release_sandwich();
    let restored = day.original_status.take().unwrap_or(AttendanceStatus::Absent);
    day.status = restored;
    debug!(employee_id = %day.employee_id, %date, restored = %restored, "Rolled back holiday");
    true
}

/// Moves a holiday from `old_date` to `new_date` for one employee.
///
/// Equivalent to [`rollback_holiday`] on the old date followed by
/// [`apply_holiday`] on the new one. Returns the dates that changed.
pub fn update_holiday(
    employee_id: &str,
    timeline: &mut Timeline,
    old_date: NaiveDate,
    new_date: NaiveDate,
) -> Vec<NaiveDate> {
    let mut changed = Vec::new();
    if rollback_holiday(timeline, old_date) {
        changed.push(old_date);
    }
    if apply_holiday(employee_id, timeline, new_date) {
        changed.push(new_date);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn timeline_with(date: NaiveDate, status: AttendanceStatus) -> Timeline {
        let mut day = AttendanceDay::new("E001", date);
        day.classify(status);
        Timeline::from([(date, day)])
    }

    // ==========================================================================
    // HP-001: apply is idempotent
    // ==========================================================================
    #[test]
    fn test_hp_001_apply_twice_equals_apply_once() {
        let date = d("2025-01-14");
        let mut once = timeline_with(date, AttendanceStatus::Present);
        apply_holiday("E001", &mut once, date);

        let mut twice = once.clone();
        assert!(!apply_holiday("E001", &mut twice, date));

        assert_eq!(once, twice);
        assert_eq!(once[&date].original_status, Some(AttendanceStatus::Present));
    }

    // ==========================================================================
    // HP-002: rollback restores the exact prior row
    // ==========================================================================
    #[test]
    fn test_hp_002_rollback_restores_prior_row() {
        let date = d("2025-01-14");
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::HalfPresent,
            AttendanceStatus::Absent,
            AttendanceStatus::Leave,
            AttendanceStatus::WeeklyOff,
        ] {
            let before = timeline_with(date, status);
            let mut timeline = before.clone();
            apply_holiday("E001", &mut timeline, date);
            rollback_holiday(&mut timeline, date);
            assert_eq!(timeline, before, "round trip failed for {status}");
        }
    }

    #[test]
    fn test_hp_003_missing_row_is_created_and_rolls_back_to_absent() {
        let date = d("2025-01-26");
        let mut timeline = Timeline::new();

        assert!(apply_holiday("E001", &mut timeline, date));
        assert_eq!(timeline[&date].original_status, Some(AttendanceStatus::Absent));

        assert!(rollback_holiday(&mut timeline, date));
        assert_eq!(timeline[&date].status, AttendanceStatus::Absent);
        assert!(timeline[&date].original_status.is_none());
    }

    // ==========================================================================
    // HP-004: manual edits are immune
    // ==========================================================================
    #[test]
    fn test_hp_004_manual_override_is_immune() {
        let date = d("2025-01-14");
        let mut timeline = timeline_with(date, AttendanceStatus::Absent);
        timeline
            .get_mut(&date)
            .unwrap()
            .apply_manual_override(AttendanceStatus::Present, "worked", "hr", Utc::now());

        assert!(!apply_holiday("E001", &mut timeline, date));
        assert!(!rollback_holiday(&mut timeline, date));
        assert_eq!(timeline[&date].status, AttendanceStatus::Present);
    }

    #[test]
    fn test_hp_005_rollback_ignores_non_holiday_rows() {
        let date = d("2025-01-14");
        let mut timeline = timeline_with(date, AttendanceStatus::Present);
        assert!(!rollback_holiday(&mut timeline, date));
        assert!(!rollback_holiday(&mut timeline, d("2025-01-15")));
        assert_eq!(timeline[&date].status, AttendanceStatus::Present);
    }

    #[test]
    fn test_hp_006_apply_lands_under_sandwich_conversion() {
        let date = d("2025-01-12");
        let mut timeline = timeline_with(date, AttendanceStatus::WeeklyOff);
        timeline.get_mut(&date).unwrap().apply_sandwich();

        assert!(apply_holiday("E001", &mut timeline, date));
        let day = &timeline[&date];
        assert_eq!(day.status, AttendanceStatus::Holiday);
        assert_eq!(day.sandwich_origin, None);
        assert_eq!(day.original_status, Some(AttendanceStatus::WeeklyOff));
    }

    #[test]
    fn test_hp_007_update_moves_the_holiday() {
        let old_date = d("2025-01-14");
        let new_date = d("2025-01-15");
        let mut timeline = timeline_with(old_date, AttendanceStatus::Present);
        apply_holiday("E001", &mut timeline, old_date);

        let changed = update_holiday("E001", &mut timeline, old_date, new_date);

        assert_eq!(changed, vec![old_date, new_date]);
        assert_eq!(timeline[&old_date].status, AttendanceStatus::Present);
        assert_eq!(timeline[&new_date].status, AttendanceStatus::Holiday);
    }
}
