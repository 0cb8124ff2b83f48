//! Time cell parsing.
//!
//! Exports record punch times as `HH:MM`, `HH:MM:SS`, or a fraction of a day
//! (`0.386145` is 09:16:03). Anything unparseable or out of range resolves to
//! "no time recorded" instead of failing, so one bad cell never aborts an
//! ingestion batch.

use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Cell;

static CLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?$").expect("Valid clock pattern")
});

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Outcome of parsing one time cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    /// A valid, non-midnight time of day.
    Recorded(NaiveTime),
    /// The cell was empty or held the zero time.
    Blank,
    /// The cell held something that is not a valid time.
    Malformed,
}

impl ParsedTime {
    /// Returns the recorded time, treating blank and malformed cells alike.
    pub fn time(self) -> Option<NaiveTime> {
        match self {
            ParsedTime::Recorded(t) => Some(t),
            ParsedTime::Blank | ParsedTime::Malformed => None,
        }
    }
}

/// Parses a grid cell as a time of day.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{parse_time_cell, ParsedTime};
/// use attendance_engine::models::Cell;
/// use chrono::NaiveTime;
///
/// let fraction = parse_time_cell(&Cell::Number(0.386145));
/// assert_eq!(fraction, ParsedTime::Recorded(NaiveTime::from_hms_opt(9, 16, 3).unwrap()));
///
/// assert_eq!(parse_time_cell(&Cell::from("9:05")).time(), NaiveTime::from_hms_opt(9, 5, 0));
/// assert_eq!(parse_time_cell(&Cell::from("25:00")), ParsedTime::Malformed);
/// assert_eq!(parse_time_cell(&Cell::Empty), ParsedTime::Blank);
/// ```
pub fn parse_time_cell(cell: &Cell) -> ParsedTime {
    match cell {
        Cell::Empty => ParsedTime::Blank,
        Cell::Number(fraction) => parse_day_fraction(*fraction),
        Cell::Text(text) => parse_time_text(text),
    }
}

/// Parses `HH:MM`, `HH:MM:SS`, or a day fraction written as text.
pub fn parse_time_text(text: &str) -> ParsedTime {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return ParsedTime::Blank;
    }

    if let Some(caps) = CLOCK_PATTERN.captures(text) {
        let field = |i: usize| {
            caps.get(i)
                .map_or(Some(0), |m| m.as_str().parse::<u32>().ok())
        };
        return match (field(1), field(2), field(3)) {
            (Some(h), Some(m), Some(s)) => from_hms(h, m, s),
            _ => ParsedTime::Malformed,
        };
    }

    match text.parse::<f64>() {
        Ok(fraction) => parse_day_fraction(fraction),
        Err(_) => ParsedTime::Malformed,
    }
}

/// Converts a fraction of a day into a time of day, rounding to the second.
pub fn parse_day_fraction(fraction: f64) -> ParsedTime {
    if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
        return ParsedTime::Malformed;
    }
    let seconds = (fraction * SECONDS_PER_DAY).round() as u32;
    if seconds >= SECONDS_PER_DAY as u32 {
        return ParsedTime::Malformed;
    }
    from_seconds(seconds)
}

/// Returns seconds since midnight for a cell, or 0 when no time is recorded.
pub fn seconds_since_midnight(cell: &Cell) -> u32 {
    parse_time_cell(cell)
        .time()
        .map_or(0, |t| t.num_seconds_from_midnight())
}

/// Formats a time in the canonical `HH:MM:SS` form.
pub fn canonical(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn from_hms(hour: u32, minute: u32, second: u32) -> ParsedTime {
    match NaiveTime::from_hms_opt(hour, minute, second) {
        Some(t) if t == NaiveTime::MIN => ParsedTime::Blank,
        Some(t) => ParsedTime::Recorded(t),
        None => ParsedTime::Malformed,
    }
}

fn from_seconds(seconds: u32) -> ParsedTime {
    if seconds == 0 {
        return ParsedTime::Blank;
    }
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
        .map_or(ParsedTime::Malformed, ParsedTime::Recorded)
}
