//! Holiday and holiday calendar models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A company holiday.
///
/// # Example
///
/// ```
/// use attendance_engine::models::Holiday;
/// use chrono::NaiveDate;
///
/// let holiday = Holiday {
///     date: NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
///     title: "Pongal".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub title: String,
}

/// The set of holidays the Day Evaluator consults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    holidays: BTreeMap<NaiveDate, String>,
}

impl HolidayCalendar {
    /// Creates a calendar from a list of holidays.
    pub fn from_holidays(holidays: impl IntoIterator<Item = Holiday>) -> Self {
        Self {
            holidays: holidays.into_iter().map(|h| (h.date, h.title)).collect(),
        }
    }

    /// Adds or renames a holiday.
    pub fn insert(&mut self, holiday: Holiday) {
        self.holidays.insert(holiday.date, holiday.title);
    }

    /// Removes a holiday, returning it if it existed.
    pub fn remove(&mut self, date: NaiveDate) -> Option<Holiday> {
        self.holidays
            .remove(&date)
            .map(|title| Holiday { date, title })
    }

    /// Checks whether a date is a holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    /// Returns the holidays in date order.
    pub fn holidays(&self) -> impl Iterator<Item = Holiday> + '_ {
        self.holidays.iter().map(|(date, title)| Holiday {
            date: *date,
            title: title.clone(),
        })
    }
}
