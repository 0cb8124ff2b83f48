//! Attendance day model and related types.
//!
//! This module defines [`AttendanceDay`], the per-employee per-date record
//! that carries raw punch times, derived timings, the day's classification
//! and the manual override audit trail.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Classification of one attendance day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Full day attended.
    Present,
    /// Half day attended; counts 0.5 present and 0.5 absent.
    HalfPresent,
    /// Not attended.
    Absent,
    /// Scheduled weekly off.
    WeeklyOff,
    /// Company holiday.
    Holiday,
    /// Approved leave.
    Leave,
}

impl AttendanceStatus {
    /// Returns true for statuses that count as a non-working day off.
    pub fn is_non_working(self) -> bool {
        matches!(self, AttendanceStatus::WeeklyOff | AttendanceStatus::Holiday)
    }

    /// Returns true for statuses that count as an absence for the sandwich rule.
    pub fn is_absence(self) -> bool {
        matches!(self, AttendanceStatus::Absent | AttendanceStatus::Leave)
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "Present"),
            AttendanceStatus::HalfPresent => write!(f, "Half Present"),
            AttendanceStatus::Absent => write!(f, "Absent"),
            AttendanceStatus::WeeklyOff => write!(f, "Weekly Off"),
            AttendanceStatus::Holiday => write!(f, "Holiday"),
            AttendanceStatus::Leave => write!(f, "Leave"),
        }
    }
}

/// A whole-second elapsed time, rendered as `HH:MM:SS`.
///
/// # Example
///
/// ```
/// use attendance_engine::models::Elapsed;
///
/// let elapsed = Elapsed::from_seconds(3725);
/// assert_eq!(elapsed.to_string(), "01:02:05");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Elapsed(u32);

impl Elapsed {
    /// The zero duration.
    pub const ZERO: Elapsed = Elapsed(0);

    /// Creates an elapsed time from a number of seconds.
    pub fn from_seconds(seconds: u32) -> Self {
        Elapsed(seconds)
    }

    /// Returns `later - earlier`, or zero when `later` is not after `earlier`.
    pub fn between(earlier: NaiveTime, later: NaiveTime) -> Self {
        let start = earlier.num_seconds_from_midnight();
        let end = later.num_seconds_from_midnight();
        Elapsed(end.saturating_sub(start))
    }

    /// Returns the number of seconds.
    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Derived timings for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTimings {
    /// How far the check-in was after the on-time threshold.
    pub late_by: Elapsed,
    /// How far the check-in was before the on-time threshold.
    pub early_by: Elapsed,
    /// How far the check-out was after the end of the shift.
    pub overtime: Elapsed,
    /// Time between check-in and check-out.
    pub duration: Elapsed,
}

/// One employee's attendance on one calendar date.
///
/// The natural key is `(employee_id, date)`. Once `is_manually_modified` is
/// set, automated processes leave `status` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceDay {
    /// The employee code.
    pub employee_id: String,
    /// The calendar date.
    pub date: NaiveDate,
    /// Free-text shift label.
    pub shift: String,
    /// Recorded check-in, if any.
    pub time_in: Option<NaiveTime>,
    /// Recorded check-out, if any.
    pub time_out: Option<NaiveTime>,
    /// Derived late/early/overtime/duration values.
    pub timings: DayTimings,
    /// The day's classification.
    pub status: AttendanceStatus,
    /// Set by a manual edit; blocks automated status changes.
    pub is_manually_modified: bool,
    /// Status before the first manual or automatic transition.
    pub original_status: Option<AttendanceStatus>,
    /// Status the sandwich rule converted from, while it holds the day at Absent.
    #[serde(default)]
    pub sandwich_origin: Option<AttendanceStatus>,
    /// Reason given for the last manual edit.
    pub change_reason: Option<String>,
    /// Who made the last manual edit.
    pub changed_by: Option<String>,
    /// When the last manual edit was made.
    pub changed_at: Option<DateTime<Utc>>,
}

/// One employee's rows keyed by date.
pub type Timeline = BTreeMap<NaiveDate, AttendanceDay>;

/// Default shift label for rows without one.
pub const DEFAULT_SHIFT: &str = "general";

impl AttendanceDay {
    /// Creates an unclassified (Absent) row with no punches.
    pub fn new(employee_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            date,
            shift: DEFAULT_SHIFT.to_string(),
            time_in: None,
            time_out: None,
            timings: DayTimings::default(),
            status: AttendanceStatus::Absent,
            is_manually_modified: false,
            original_status: None,
            sandwich_origin: None,
            change_reason: None,
            changed_by: None,
            changed_at: None,
        }
    }

    /// Returns true if a human has edited this row's status.
    pub fn is_locked(&self) -> bool {
        self.is_manually_modified
    }

    /// Returns true if the row has a recorded check-in.
    pub fn has_check_in(&self) -> bool {
        self.time_in.is_some()
    }

    /// The status underneath any sandwich conversion.
    pub fn base_status(&self) -> AttendanceStatus {
        self.sandwich_origin.unwrap_or(self.status)
    }

    /// Writes a fresh classification.
    ///
    /// Unlike [`transition_to`](Self::transition_to) this replaces the row's
    /// baseline: any pending sandwich conversion and captured original status
    /// are discarded. Locked rows are left alone and false is returned.
    pub fn classify(&mut self, status: AttendanceStatus) -> bool {
        if self.is_manually_modified {
            return false;
        }
        self.sandwich_origin = None;
        self.original_status = None;
        self.status = status;
        true
    }

    /// Writes a Holiday classification for a date on the holiday calendar.
    ///
    /// `underlying` is what the row's punches earn on a working day; it is
    /// kept as `original_status` so that deleting the holiday restores it,
    /// exactly as after [`transition_to`](Self::transition_to).
    pub fn classify_holiday(&mut self, underlying: AttendanceStatus) -> bool {
        if !self.classify(AttendanceStatus::Holiday) {
            return false;
        }
        if underlying != AttendanceStatus::Holiday {
            self.original_status = Some(underlying);
        }
        true
    }

    /// Forces the row to Absent on behalf of the sandwich rule.
    ///
    /// Returns false for locked rows, rows already converted, and rows that
    /// are already Absent.
    pub fn apply_sandwich(&mut self) -> bool {
        if self.is_manually_modified
            || self.sandwich_origin.is_some()
            || self.status == AttendanceStatus::Absent
        {
            return false;
        }
        self.original_status.get_or_insert(self.status);
        self.sandwich_origin = Some(self.status);
        self.status = AttendanceStatus::Absent;
        true
    }

    /// Undoes a sandwich conversion, restoring the pre-conversion status.
    pub fn release_sandwich(&mut self) -> bool {
        if self.is_manually_modified {
            return false;
        }
        let Some(origin) = self.sandwich_origin.take() else {
            return false;
        };
        if self.original_status == Some(origin) {
            self.original_status = None;
        }
        self.status = origin;
        true
    }

    /// Applies an automated status transition.
    ///
    /// Captures `original_status` the first time the status changes. Returns
    /// false without touching the row if it is manually modified or already
    /// carries `status`.
    pub fn transition_to(&mut self, status: AttendanceStatus) -> bool {
        if self.is_manually_modified || self.status == status {
            return false;
        }
        if self.original_status.is_none() {
            self.original_status = Some(self.status);
        }
        self.status = status;
        true
    }

    /// Records a manual status edit.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::{AttendanceDay, AttendanceStatus};
    /// use chrono::{NaiveDate, Utc};
    ///
    /// let mut day = AttendanceDay::new("E001", NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    /// day.apply_manual_override(AttendanceStatus::Present, "forgot to punch", "hr.admin", Utc::now());
    ///
    /// assert!(day.is_locked());
    /// assert_eq!(day.original_status, Some(AttendanceStatus::Absent));
    /// ```
    pub fn apply_manual_override(
        &mut self,
        status: AttendanceStatus,
        reason: impl Into<String>,
        changed_by: impl Into<String>,
        changed_at: DateTime<Utc>,
    ) {
        if !self.is_manually_modified && self.original_status.is_none() {
            self.original_status = Some(self.status);
        }
        self.status = status;
        self.is_manually_modified = true;
        self.sandwich_origin = None;
        self.change_reason = Some(reason.into());
        self.changed_by = Some(changed_by.into());
        self.changed_at = Some(changed_at);
    }
}
