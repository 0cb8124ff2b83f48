//! Attendance export ingestion.
//!
//! Exports are grids laid out in employee blocks:
//!
//! ```text
//! Employee Code: | 1001 | Employee Name: | A. Kumar
//! Days           | 6-Jan | 7-Jan | 8-Jan
//!                | Mon   | Tue   | Wed
//! Shift          | GS    | GS    | GS
//! In Time        | 09:05 | 0.3875|
//! Out Time       | 17:40 | 17:31 |
//! ```
//!
//! Every row is first given a [`RowKind`]; data rows are then aligned to the
//! active date header. Problems are recorded per cell or per row in the
//! returned skip list and never abort the parse.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AttendancePolicy;
use crate::error::EngineResult;
use crate::models::{
    AttendanceDay, AttendanceStatus, Cell, DEFAULT_SHIFT, HolidayCalendar, PayrollCycle, SkipKind,
    SkipReason,
};

use super::cycle_counters::CycleCounterStore;
use super::day_evaluation::{DayInput, derive_timings, evaluate_day};
use super::time_parsing::{ParsedTime, parse_time_cell};

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})\s*-\s*([A-Za-z]{3})").expect("Valid day-month pattern")
});

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?$").expect("Valid weekday pattern")
});

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// What a grid row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Starts an employee block.
    Employee,
    /// The date header of the current block.
    Days,
    /// Shift labels per date.
    Shift,
    /// Check-in times per date.
    InTime,
    /// Check-out times per date.
    OutTime,
    /// Weekday decoration under the date header.
    Weekday,
    /// Anything else.
    Ignore,
}

/// One employee's punches on one date, as read from an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// The employee code.
    pub employee_id: String,
    /// The calendar date.
    pub date: NaiveDate,
    /// Shift label.
    pub shift: String,
    /// Check-in, if one was recorded.
    pub time_in: Option<NaiveTime>,
    /// Check-out, if one was recorded.
    pub time_out: Option<NaiveTime>,
}

impl RawEntry {
    fn new(employee_id: &str, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            date,
            shift: DEFAULT_SHIFT.to_string(),
            time_in: None,
            time_out: None,
        }
    }

    /// Copies the raw fields onto an attendance row.
    pub fn merge_into(&self, day: &mut AttendanceDay) {
        day.shift = self.shift.clone();
        day.time_in = self.time_in;
        day.time_out = self.time_out;
    }

    /// Builds a fresh attendance row from the entry.
    pub fn to_day(&self) -> AttendanceDay {
        let mut day = AttendanceDay::new(self.employee_id.clone(), self.date);
        self.merge_into(&mut day);
        day
    }
}

/// An employee found in an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEmployee {
    /// The employee code.
    pub employee_id: String,
    /// The display name, when the export carries one.
    pub name: Option<String>,
}

/// The result of parsing one export grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedExport {
    /// Employees in order of first appearance.
    pub employees: Vec<ExportEmployee>,
    /// One entry per `(employee, date)`, ordered by employee then date.
    pub entries: Vec<RawEntry>,
    /// Rows and cells that could not be used.
    pub skipped: Vec<SkipReason>,
}

impl ParsedExport {
    /// Moves the entries out grouped by employee, each group in ascending date order.
    pub fn take_by_employee(&mut self) -> BTreeMap<String, Vec<RawEntry>> {
        let mut grouped: BTreeMap<String, Vec<RawEntry>> = BTreeMap::new();
        for entry in std::mem::take(&mut self.entries) {
            grouped.entry(entry.employee_id.clone()).or_default().push(entry);
        }
        grouped
    }
}

/// Lowercases a label and turns punctuation into single spaces.
pub fn normalize_label(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_code_label(label: &str) -> bool {
    label.contains("employee code") || label.contains("emp code") || label.contains("empcode")
}

fn is_name_label(label: &str) -> bool {
    label.contains("employee name") || label == "name" || label == "emp name"
}

/// Determines the kind of a grid row.
pub fn classify_row(row: &[Cell]) -> RowKind {
    let labels: Vec<String> = row
        .iter()
        .filter_map(Cell::as_text)
        .map(normalize_label)
        .collect();
    if labels.iter().any(|l| is_code_label(l)) {
        return RowKind::Employee;
    }

    let Some(first) = row.first() else {
        return RowKind::Ignore;
    };
    if first.is_blank() {
        let rest: Vec<&str> = row[1..].iter().filter_map(Cell::as_text).collect();
        let decorated = !rest.is_empty()
            && row[1..].iter().all(|c| c.is_blank() || c.as_text().is_some())
            && rest.iter().all(|t| WEEKDAY.is_match(t));
        return if decorated { RowKind::Weekday } else { RowKind::Ignore };
    }

    match normalize_label(&first.display_text()).as_str() {
        "days" | "day" | "date" | "dates" => RowKind::Days,
        "shift" | "shifts" => RowKind::Shift,
        "in time" | "intime" | "in" | "time in" => RowKind::InTime,
        "out time" | "outtime" | "out" | "time out" => RowKind::OutTime,
        _ => RowKind::Ignore,
    }
}

/// Resolves a `day-Mon` header cell against the export's date range.
///
/// The year is taken from `from` first and then from `to`, so a range that
/// spans New Year resolves `28-Dec` and `3-Jan` correctly.
pub fn resolve_header_date(text: &str, from: NaiveDate, to: NaiveDate) -> Option<NaiveDate> {
    let caps = DAY_MONTH.captures(text.trim())?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month_abbrev = caps.get(2)?.as_str().to_ascii_lowercase();
    let month = MONTHS.iter().position(|m| *m == month_abbrev)? as u32 + 1;

    [from.year(), to.year()]
        .into_iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| (from..=to).contains(date))
}

fn employee_fields(row: &[Cell]) -> (Option<String>, Option<String>) {
    let mut code = None;
    let mut name = None;

    for (i, cell) in row.iter().enumerate() {
        let Some(text) = cell.as_text() else { continue };
        let label = normalize_label(text);
        let is_code = is_code_label(&label);
        let is_name = !is_code && is_name_label(&label);
        if !is_code && !is_name {
            continue;
        }

        let inline = text
            .split_once(':')
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let value = inline.or_else(|| {
            row[i + 1..]
                .iter()
                .find(|c| !c.is_blank())
                .filter(|c| {
                    let next = normalize_label(&c.display_text());
                    !is_code_label(&next) && !is_name_label(&next)
                })
                .map(Cell::display_text)
        });

        if is_code {
            code = code.or(value);
        } else {
            name = name.or(value);
        }
    }

    (code, name)
}

struct Block {
    employee_id: String,
    header: Option<Vec<Option<NaiveDate>>>,
}

/// Parses an export grid into raw per-day entries.
///
/// Only dates inside `from..=to` are kept. Every resolved date of a block
/// gets an entry, so days without punches still produce a row.
pub fn parse_grid(grid: &[Vec<Cell>], from: NaiveDate, to: NaiveDate) -> ParsedExport {
    let mut export = ParsedExport::default();
    let mut entries: BTreeMap<(String, NaiveDate), RawEntry> = BTreeMap::new();
    let mut block: Option<Block> = None;

    for (row_index, row) in grid.iter().enumerate() {
        match classify_row(row) {
            RowKind::Employee => {
                let (code, name) = employee_fields(row);
                block = match code {
                    Some(employee_id) => {
                        if !export.employees.iter().any(|e| e.employee_id == employee_id) {
                            export.employees.push(ExportEmployee {
                                employee_id: employee_id.clone(),
                                name,
                            });
                        }
                        Some(Block {
                            employee_id,
                            header: None,
                        })
                    }
                    None => {
                        warn!(row = row_index, "Employee row without a code");
                        export.skipped.push(
                            SkipReason::new(SkipKind::MissingEmployeeCode, "employee row has no code")
                                .at(row_index, None),
                        );
                        None
                    }
                };
            }
            RowKind::Days => {
                let Some(current) = block.as_mut() else {
                    export.skipped.push(
                        SkipReason::new(SkipKind::MissingEmployee, "date header outside an employee block")
                            .at(row_index, None),
                    );
                    continue;
                };
                let mut header = vec![None; row.len()];
                for (column, cell) in row.iter().enumerate().skip(1) {
                    if cell.is_blank() {
                        continue;
                    }
                    let text = cell.display_text();
                    match resolve_header_date(&text, from, to) {
                        Some(date) => {
                            header[column] = Some(date);
                            entries
                                .entry((current.employee_id.clone(), date))
                                .or_insert_with(|| RawEntry::new(&current.employee_id, date));
                        }
                        None => {
                            debug!(row = row_index, column, header = %text, "Unresolved date header");
                            export.skipped.push(
                                SkipReason::new(
                                    SkipKind::UnresolvedDate,
                                    format!("date header '{text}' is not in {from}..={to}"),
                                )
                                .at(row_index, Some(column))
                                .for_employee(current.employee_id.clone()),
                            );
                        }
                    }
                }
                current.header = Some(header);
            }
            kind @ (RowKind::Shift | RowKind::InTime | RowKind::OutTime) => {
                let Some(current) = block.as_ref() else {
                    export.skipped.push(
                        SkipReason::new(SkipKind::MissingEmployee, "data row outside an employee block")
                            .at(row_index, None),
                    );
                    continue;
                };
                let Some(header) = current.header.as_ref() else {
                    export.skipped.push(
                        SkipReason::new(SkipKind::MissingDateHeader, "data row before a date header")
                            .at(row_index, None)
                            .for_employee(current.employee_id.clone()),
                    );
                    continue;
                };

                for (column, cell) in row.iter().enumerate().skip(1) {
                    if cell.is_blank() {
                        continue;
                    }
                    let Some(date) = header.get(column).copied().flatten() else {
                        export.skipped.push(
                            SkipReason::new(SkipKind::UnresolvedDate, "cell has no date column")
                                .at(row_index, Some(column))
                                .for_employee(current.employee_id.clone()),
                        );
                        continue;
                    };
                    let entry = entries
                        .entry((current.employee_id.clone(), date))
                        .or_insert_with(|| RawEntry::new(&current.employee_id, date));

                    if kind == RowKind::Shift {
                        entry.shift = cell.display_text();
                        continue;
                    }
                    let time = match parse_time_cell(cell) {
                        ParsedTime::Recorded(t) => Some(t),
                        ParsedTime::Blank => None,
                        ParsedTime::Malformed => {
                            debug!(row = row_index, column, cell = %cell.display_text(), "Malformed time cell");
                            export.skipped.push(
                                SkipReason::new(
                                    SkipKind::MalformedTime,
                                    format!("'{}' is not a time", cell.display_text()),
                                )
                                .at(row_index, Some(column))
                                .for_employee(current.employee_id.clone())
                                .on(date),
                            );
                            None
                        }
                    };
                    if kind == RowKind::InTime {
                        entry.time_in = time;
                    } else {
                        entry.time_out = time;
                    }
                }
            }
            RowKind::Weekday | RowKind::Ignore => {}
        }
    }

    export.entries = entries.into_values().collect();
    export
}

/// Classifies an employee's rows in date order.
///
/// `days` must be sorted by date. Manually modified rows and Leave rows keep
/// their status and consume no credits; every other row is re-evaluated from
/// its punches and written with [`AttendanceDay::classify`], which also drops
/// any sandwich conversion. Calendar holidays keep what their punches would
/// earn on a working day as the rollback target, without consuming credits.
/// Derived timings are refreshed for every row.
///
/// # Errors
///
/// Returns [`EngineError::OutOfOrderDay`](crate::error::EngineError::OutOfOrderDay)
/// if the rows are not strictly ascending or the store has already seen a
/// later date in the same cycle.
pub fn classify_days(
    days: &mut [AttendanceDay],
    calendar: &HolidayCalendar,
    policy: &AttendancePolicy,
    store: &mut CycleCounterStore,
) -> EngineResult<()> {
    for day in days.iter_mut() {
        day.timings = derive_timings(day.time_in, day.time_out, &policy.time_windows);

        if day.is_locked() || day.base_status() == AttendanceStatus::Leave {
            store.pass(&day.employee_id, day.date)?;
            continue;
        }

        let input = DayInput {
            time_in: day.time_in,
            time_out: day.time_out,
            is_weekly_off: policy.is_weekly_off(day.date.weekday()),
            is_holiday: calendar.is_holiday(day.date),
        };
        if input.is_holiday {
            let working = DayInput {
                is_holiday: false,
                ..input
            };
            let counters = store.snapshot(&day.employee_id, PayrollCycle::for_date(day.date));
            let underlying = evaluate_day(&working, counters, policy).status;
            store.classify(&day.employee_id, day.date, &input, policy)?;
            day.classify_holiday(underlying);
            continue;
        }

        let evaluation = store.classify(&day.employee_id, day.date, &input, policy)?;
        day.classify(evaluation.status);
    }
    Ok(())
}
