//! Request types for the batch service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceStatus, Grid, PayrollCycle, SalaryField, SalaryMaster};

/// An attendance export to ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// The cleaned export grid.
    pub grid: Grid,
    /// First date the export covers (inclusive).
    pub from: NaiveDate,
    /// Last date the export covers (inclusive).
    pub to: NaiveDate,
}

/// A human correction to one attendance day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRequest {
    /// The employee code.
    pub employee_id: String,
    /// The corrected date.
    pub date: NaiveDate,
    /// The status to set.
    pub status: AttendanceStatus,
    /// Why the status was changed.
    pub reason: String,
    /// Who changed it.
    pub changed_by: String,
}

/// Salary generation for every summarized employee of a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryRequest {
    /// The payroll cycle.
    pub cycle: PayrollCycle,
    /// Effective-dated salary master snapshots.
    pub masters: Vec<SalaryMaster>,
}

/// A human-entered value for one salary field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryOverrideRequest {
    /// The employee code.
    pub employee_id: String,
    /// The payroll cycle.
    pub cycle: PayrollCycle,
    /// The overridden field.
    pub field: SalaryField,
    /// The value to set; `None` clears an existing override.
    #[serde(default)]
    pub value: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_request_deserializes() {
        let json = r#"{
            "employee_id": "E001",
            "date": "2025-01-13",
            "status": "present",
            "reason": "client visit",
            "changed_by": "hr"
        }"#;
        let request: OverrideRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.status, AttendanceStatus::Present);
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
    }

    #[test]
    fn test_salary_override_value_defaults_to_clear() {
        let json = r#"{
            "employee_id": "E001",
            "cycle": { "year": 2025, "month": 1 },
            "field": "net_pay"
        }"#;
        let request: SalaryOverrideRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.field, SalaryField::NetPay);
        assert!(request.value.is_none());
    }
}
