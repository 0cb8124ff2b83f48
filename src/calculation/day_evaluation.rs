//! Day classification state machine.
//!
//! This module classifies a single day's attendance from its check-in and
//! check-out times and a read-only snapshot of the cycle's late/permission
//! counters. It never reads or writes the counter store itself; the credits
//! it returns are proposals the caller commits only when the day resolves to
//! [`AttendanceStatus::Present`].

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::config::{AttendancePolicy, TimeWindows};
use crate::models::{AttendanceStatus, DayTimings, Elapsed};

use super::cycle_counters::CycleCounters;

/// Everything the evaluator needs to know about one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayInput {
    /// Recorded check-in.
    pub time_in: Option<NaiveTime>,
    /// Recorded check-out.
    pub time_out: Option<NaiveTime>,
    /// Whether the date is a weekly off.
    pub is_weekly_off: bool,
    /// Whether the date is a company holiday.
    pub is_holiday: bool,
}

/// The evaluator's verdict for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEvaluation {
    /// The classification.
    pub status: AttendanceStatus,
    /// Late credits proposed for this day.
    pub late_consumed: u32,
    /// Permission credits proposed for this day.
    pub permission_consumed: u32,
}

impl DayEvaluation {
    fn terminal(status: AttendanceStatus) -> Self {
        Self {
            status,
            late_consumed: 0,
            permission_consumed: 0,
        }
    }

    /// Credits to commit: the proposals for a Present day, nothing otherwise.
    pub fn committed_credits(&self) -> (u32, u32) {
        if self.status == AttendanceStatus::Present {
            (self.late_consumed, self.permission_consumed)
        } else {
            (0, 0)
        }
    }
}

/// Classifies one day.
///
/// # Rules
///
/// 1. Holiday, then weekly off, then a missing check-in are terminal.
/// 2. Check-in up to `on_time_until` is on time. Up to `late_until` it takes a
///    late credit, or a permission credit once late credits are gone; with both
///    exhausted the day stays tentatively present. Up to `permission_until` it
///    takes a permission credit if one is left. Up to `half_day_until` the day
///    is a half day; later check-ins are absent.
/// 3. A tentatively present day with no check-out stays present.
/// 4. Check-out at or after `shift_end` confirms presence. From
///    `early_leave_from` it needs one more permission credit, otherwise the day
///    drops to a half day. Earlier check-outs are half days.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{evaluate_day, CycleCounters, DayInput};
/// use attendance_engine::config::AttendancePolicy;
/// use attendance_engine::models::AttendanceStatus;
/// use chrono::NaiveTime;
///
/// let input = DayInput {
///     time_in: NaiveTime::from_hms_opt(9, 20, 0),
///     time_out: NaiveTime::from_hms_opt(18, 0, 0),
///     is_weekly_off: false,
///     is_holiday: false,
/// };
/// let result = evaluate_day(&input, CycleCounters::default(), &AttendancePolicy::default());
///
/// assert_eq!(result.status, AttendanceStatus::Present);
/// assert_eq!(result.late_consumed, 1);
/// assert_eq!(result.permission_consumed, 0);
/// ```
pub fn evaluate_day(
    input: &DayInput,
    counters: CycleCounters,
    policy: &AttendancePolicy,
) -> DayEvaluation {
    if input.is_holiday {
        return DayEvaluation::terminal(AttendanceStatus::Holiday);
    }
    if input.is_weekly_off {
        return DayEvaluation::terminal(AttendanceStatus::WeeklyOff);
    }
    let Some(time_in) = input.time_in else {
        return DayEvaluation::terminal(AttendanceStatus::Absent);
    };

    let windows = &policy.time_windows;
    let quotas = &policy.quotas;
    let late_left = counters.late_used < quotas.late_per_cycle;
    let permission_left = counters.permission_used < quotas.permission_per_cycle;

    let (late, mut permission) = if time_in <= windows.on_time_until {
        (0, 0)
    } else if time_in <= windows.late_until {
        if late_left {
            (1, 0)
        } else if permission_left {
            (0, 1)
        } else {
            (0, 0)
        }
    } else if time_in <= windows.permission_until {
        (0, u32::from(permission_left))
    } else if time_in <= windows.half_day_until {
        return DayEvaluation::terminal(AttendanceStatus::HalfPresent);
    } else {
        return DayEvaluation::terminal(AttendanceStatus::Absent);
    };

    let status = match input.time_out {
        None => AttendanceStatus::Present,
        Some(out) if out >= windows.shift_end => AttendanceStatus::Present,
        Some(out) if out >= windows.early_leave_from => {
            if counters.permission_used + permission < quotas.permission_per_cycle {
                permission += 1;
                AttendanceStatus::Present
            } else {
                AttendanceStatus::HalfPresent
            }
        }
        Some(_) => AttendanceStatus::HalfPresent,
    };

    DayEvaluation {
        status,
        late_consumed: late,
        permission_consumed: permission,
    }
}

/// Computes late/early/overtime/duration for a day's punches.
///
/// Values that do not apply (no punch, or a negative difference) are zero.
pub fn derive_timings(
    time_in: Option<NaiveTime>,
    time_out: Option<NaiveTime>,
    windows: &TimeWindows,
) -> DayTimings {
    let late_by = time_in.map_or(Elapsed::ZERO, |t| Elapsed::between(windows.on_time_until, t));
    let early_by = time_in.map_or(Elapsed::ZERO, |t| Elapsed::between(t, windows.on_time_until));
    let overtime = time_out.map_or(Elapsed::ZERO, |t| Elapsed::between(windows.shift_end, t));
    let duration = match (time_in, time_out) {
        (Some(i), Some(o)) => Elapsed::between(i, o),
        _ => Elapsed::ZERO,
    };

    DayTimings {
        late_by,
        early_by,
        overtime,
        duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(time_str: &str) -> Option<NaiveTime> {
        Some(NaiveTime::parse_from_str(time_str, "%H:%M:%S").unwrap())
    }

    fn workday(time_in: Option<NaiveTime>, time_out: Option<NaiveTime>) -> DayInput {
        DayInput {
            time_in,
            time_out,
            is_weekly_off: false,
            is_holiday: false,
        }
    }

    fn counters(late_used: u32, permission_used: u32) -> CycleCounters {
        CycleCounters {
            late_used,
            permission_used,
        }
    }

    fn eval(input: DayInput, c: CycleCounters) -> DayEvaluation {
        evaluate_day(&input, c, &AttendancePolicy::default())
    }

    // ==========================================================================
    // DE-001..003: terminal classifications
    // ==========================================================================
    #[test]
    fn test_de_001_holiday_wins_over_everything() {
        let input = DayInput {
            is_holiday: true,
            is_weekly_off: true,
            ..workday(t("09:00:00"), t("18:00:00"))
        };
        assert_eq!(eval(input, counters(0, 0)).status, AttendanceStatus::Holiday);
    }

    #[test]
    fn test_de_002_weekly_off_even_with_punches() {
        let input = DayInput {
            is_weekly_off: true,
            ..workday(t("09:00:00"), t("18:00:00"))
        };
        let result = eval(input, counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::WeeklyOff);
        assert_eq!(result.committed_credits(), (0, 0));
    }

    #[test]
    fn test_de_003_no_check_in_is_absent() {
        let result = eval(workday(None, t("18:00:00")), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::Absent);
    }

    // ==========================================================================
    // DE-010..016: check-in windows
    // ==========================================================================
    #[test]
    fn test_de_010_on_time_boundary_inclusive() {
        let result = eval(workday(t("09:16:00"), t("17:30:00")), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (0, 0));
    }

    #[test]
    fn test_de_011_one_second_late_takes_late_credit() {
        let result = eval(workday(t("09:16:01"), t("17:30:00")), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (1, 0));
    }

    #[test]
    fn test_de_012_late_window_falls_back_to_permission() {
        let result = eval(workday(t("09:30:00"), t("18:00:00")), counters(3, 0));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (0, 1));
    }

    #[test]
    fn test_de_013_late_window_exhausted_still_present() {
        let result = eval(workday(t("09:29:00"), t("18:00:00")), counters(3, 2));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (0, 0));
    }

    #[test]
    fn test_de_014_permission_window() {
        let result = eval(workday(t("10:45:00"), t("17:45:00")), counters(0, 1));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (0, 1));

        let at_limit = eval(workday(t("11:00:00"), t("17:45:00")), counters(0, 0));
        assert_eq!(at_limit.committed_credits(), (0, 1));
    }

    #[test]
    fn test_de_015_half_day_window_is_terminal() {
        let result = eval(workday(t("11:00:01"), t("19:00:00")), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::HalfPresent);

        let noon = eval(workday(t("13:00:00"), None), counters(0, 0));
        assert_eq!(noon.status, AttendanceStatus::HalfPresent);
    }

    #[test]
    fn test_de_016_afternoon_check_in_is_absent() {
        let result = eval(workday(t("13:00:01"), t("18:00:00")), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::Absent);
    }

    // ==========================================================================
    // DE-020..024: check-out evaluation
    // ==========================================================================
    #[test]
    fn test_de_020_missing_check_out_keeps_present() {
        let result = eval(workday(t("09:20:00"), None), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (1, 0));
    }

    #[test]
    fn test_de_021_early_leave_takes_permission() {
        let result = eval(workday(t("09:00:00"), t("15:30:00")), counters(0, 1));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (0, 1));
    }

    #[test]
    fn test_de_022_early_leave_without_permission_is_half_day() {
        let result = eval(workday(t("09:00:00"), t("17:29:59")), counters(0, 2));
        assert_eq!(result.status, AttendanceStatus::HalfPresent);
        assert_eq!(result.committed_credits(), (0, 0));
    }

    #[test]
    fn test_de_023_check_in_permission_counts_against_check_out() {
        // 10:00 check-in uses the last permission, so a 16:00 check-out cannot
        // take another one.
        let result = eval(workday(t("10:00:00"), t("16:00:00")), counters(0, 1));
        assert_eq!(result.status, AttendanceStatus::HalfPresent);
        assert_eq!(result.committed_credits(), (0, 0));
    }

    #[test]
    fn test_de_024_two_permissions_in_one_day() {
        let result = eval(workday(t("10:00:00"), t("16:00:00")), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::Present);
        assert_eq!(result.committed_credits(), (0, 2));
    }

    #[test]
    fn test_de_025_leaving_before_1530_is_half_day() {
        let result = eval(workday(t("09:00:00"), t("15:29:59")), counters(0, 0));
        assert_eq!(result.status, AttendanceStatus::HalfPresent);
    }

    #[test]
    fn test_evaluation_is_pure() {
        let input = workday(t("09:25:00"), t("16:00:00"));
        let first = eval(input, counters(1, 1));
        let second = eval(input, counters(1, 1));
        assert_eq!(first, second);
    }

    // ==========================================================================
    // Derived timings
    // ==========================================================================
    #[test]
    fn test_timings_for_late_arrival_with_overtime() {
        let windows = TimeWindows::default();
        let timings = derive_timings(t("09:20:00"), t("18:00:00"), &windows);
        assert_eq!(timings.late_by.to_string(), "00:04:00");
        assert_eq!(timings.early_by, Elapsed::ZERO);
        assert_eq!(timings.overtime.to_string(), "00:30:00");
        assert_eq!(timings.duration.to_string(), "08:40:00");
    }

    #[test]
    fn test_timings_for_early_arrival_without_check_out() {
        let windows = TimeWindows::default();
        let timings = derive_timings(t("09:00:00"), None, &windows);
        assert_eq!(timings.late_by, Elapsed::ZERO);
        assert_eq!(timings.early_by.to_string(), "00:16:00");
        assert_eq!(timings.overtime, Elapsed::ZERO);
        assert_eq!(timings.duration, Elapsed::ZERO);
    }

    #[test]
    fn test_timings_without_punches_are_zero() {
        let timings = derive_timings(None, None, &TimeWindows::default());
        assert_eq!(timings, DayTimings::default());
    }
}
