//! Response types for the batch service.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceDay, AuditStep, BatchReport, SalaryRecord};

/// Result of generating salaries for a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryBatch {
    /// Generated and skipped employees.
    pub report: BatchReport,
    /// The records written, in employee order.
    pub records: Vec<SalaryRecord>,
    /// Derivation steps per employee.
    pub audit: BTreeMap<String, Vec<AuditStep>>,
}

/// Result of a single-employee change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayChange {
    /// The row as stored after the change.
    pub day: AttendanceDay,
    /// Every date of the employee whose status changed, in date order.
    pub changed_dates: Vec<NaiveDate>,
}
