//! Payroll cycle key.
//!
//! A payroll cycle runs from the 21st of one month through the 20th of the
//! next. It is keyed by the month in which it ends, so `2025-01` spans
//! 2024-12-21 through 2025-01-20.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Day of month on which every payroll cycle starts.
pub const CYCLE_START_DAY: u32 = 21;

/// Identifies one payroll cycle.
///
/// # Example
///
/// ```
/// use attendance_engine::models::PayrollCycle;
/// use chrono::NaiveDate;
///
/// let on_20th = PayrollCycle::for_date(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
/// let on_21st = PayrollCycle::for_date(NaiveDate::from_ymd_opt(2025, 1, 21).unwrap());
///
/// assert_eq!(on_20th.to_string(), "2025-01");
/// assert_eq!(on_21st.to_string(), "2025-02");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PayrollCycle {
    /// Year of the month the cycle ends in.
    pub year: i32,
    /// Month (1-12) the cycle ends in.
    pub month: u32,
}

impl PayrollCycle {
    /// Creates a cycle key, rejecting months outside 1-12.
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::InvalidCycle { year, month });
        }
        Ok(Self { year, month })
    }

    /// Returns the cycle a date belongs to.
    pub fn for_date(date: NaiveDate) -> Self {
        if date.day() < CYCLE_START_DAY {
            Self {
                year: date.year(),
                month: date.month(),
            }
        } else if date.month() == 12 {
            Self {
                year: date.year() + 1,
                month: 1,
            }
        } else {
            Self {
                year: date.year(),
                month: date.month() + 1,
            }
        }
    }

    /// Returns the cycle immediately before this one.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// First date of the cycle (the 21st of the previous month).
    pub fn start_date(self) -> NaiveDate {
        let prev = self.previous();
        NaiveDate::from_ymd_opt(prev.year, prev.month, CYCLE_START_DAY).unwrap_or(NaiveDate::MIN)
    }

    /// Last date of the cycle (the 20th of the cycle month).
    pub fn end_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, CYCLE_START_DAY - 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Calendar length of the cycle in days.
    pub fn total_days(self) -> u32 {
        let days = (self.end_date() - self.start_date()).num_days() + 1;
        u32::try_from(days).unwrap_or(0)
    }

    /// Checks whether a date falls inside the cycle (inclusive).
    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Iterates every calendar date in the cycle.
    pub fn dates(self) -> impl Iterator<Item = NaiveDate> {
        self.start_date()
            .iter_days()
            .take(self.total_days() as usize)
    }
}

impl std::fmt::Display for PayrollCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
