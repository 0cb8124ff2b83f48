//! Async batch service for the Attendance Engine.
//!
//! This module wires the pure calculation functions to the ledger: export
//! ingestion on a bounded worker pool, holiday and leave propagation,
//! manual overrides and salary generation.

mod locks;
mod operations;
mod request;
mod response;
mod state;

pub use locks::EmployeeLocks;
pub use operations::{
    add_holiday, apply_leave, attendance_day, cycle_counters, cycle_days, delete_holiday,
    generate_salaries, generate_salary, ingest_export, monthly_summary, override_day,
    override_salary, salary_record, update_holiday,
};
pub use request::{IngestRequest, OverrideRequest, SalaryOverrideRequest, SalaryRequest};
pub use response::{DayChange, SalaryBatch};
pub use state::EngineState;
