//! Calculation logic for the Attendance Engine.
//!
//! This module contains the pure building blocks of the engine: time cell
//! parsing, the day evaluation state machine and its per-cycle counters,
//! export ingestion, cycle aggregation, holiday/sandwich/leave propagation
//! over an employee's timeline, and salary derivation.

mod aggregation;
mod cycle_counters;
mod day_evaluation;
mod holiday_propagation;
mod ingestion;
mod leave;
mod salary;
mod sandwich;
mod time_parsing;

pub use aggregation::aggregate_cycle;
pub use cycle_counters::{CounterState, CycleCounterStore, CycleCounters};
pub use day_evaluation::{DayEvaluation, DayInput, derive_timings, evaluate_day};
pub use holiday_propagation::{apply_holiday, rollback_holiday, update_holiday};
pub use ingestion::{
    ExportEmployee, ParsedExport, RawEntry, RowKind, classify_days, classify_row,
    normalize_label, parse_grid, resolve_header_date,
};
pub use leave::{apply_leave, classify_leave};
pub use salary::{SalaryDerivation, SalaryInput, derive_salary};
pub use sandwich::{
    apply_sandwich_rule, apply_sandwich_rule_between, recheck_sandwich, sandwich_holds,
};
pub use time_parsing::{
    ParsedTime, canonical, parse_day_fraction, parse_time_cell, parse_time_text,
    seconds_since_midnight,
};
