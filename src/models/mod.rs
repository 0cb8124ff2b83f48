//! Core data models for the Attendance Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance_day;
mod grid;
mod holiday;
mod payroll_cycle;
mod report;
mod salary;
mod summary;

pub use attendance_day::{
    AttendanceDay, AttendanceStatus, DEFAULT_SHIFT, DayTimings, Elapsed, Timeline,
};
pub use grid::{Cell, Grid};
pub use holiday::{Holiday, HolidayCalendar};
pub use payroll_cycle::{CYCLE_START_DAY, PayrollCycle};
pub use report::{AuditStep, BatchReport, SkipKind, SkipReason};
pub use salary::{
    LeaveClassification, LeaveRecord, SalaryField, SalaryMaster, SalaryRecord, TrackedAmount,
};
pub use summary::MonthlySummary;
