//! Batch reports and audit steps.
//!
//! Batch operations never abort on a bad row. They return a [`BatchReport`]
//! listing what succeeded and a structured reason for everything skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a row, cell or employee was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// A time cell could not be parsed; the time was treated as not recorded.
    MalformedTime,
    /// A date header cell could not be parsed or fell outside the requested range.
    UnresolvedDate,
    /// A data row appeared before any date header in the employee block.
    MissingDateHeader,
    /// A data row appeared before any employee block.
    MissingEmployee,
    /// An employee block had no employee code.
    MissingEmployeeCode,
    /// No salary master was effective for the cycle.
    MissingSalaryMaster,
    /// The employee's processing failed as a whole.
    EmployeeFailed,
}

/// One skipped item in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipReason {
    /// The kind of problem.
    pub kind: SkipKind,
    /// Zero-based grid row, when the problem came from a grid.
    pub row: Option<usize>,
    /// Zero-based grid column, when the problem is a single cell.
    pub column: Option<usize>,
    /// The employee the item belonged to, if known.
    pub employee_id: Option<String>,
    /// The date the item belonged to, if known.
    pub date: Option<NaiveDate>,
    /// Human-readable detail.
    pub detail: String,
}

impl SkipReason {
    /// Creates a skip reason with only a kind and detail.
    pub fn new(kind: SkipKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            row: None,
            column: None,
            employee_id: None,
            date: None,
            detail: detail.into(),
        }
    }

    /// Attaches a grid position.
    pub fn at(mut self, row: usize, column: Option<usize>) -> Self {
        self.row = Some(row);
        self.column = column;
        self
    }

    /// Attaches an employee.
    pub fn for_employee(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    /// Attaches a date.
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Result of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Correlation id of the batch.
    pub batch_id: Uuid,
    /// Number of items committed.
    pub succeeded: usize,
    /// Number of items skipped.
    pub skipped: usize,
    /// One entry per skipped item.
    pub skip_reasons: Vec<SkipReason>,
}

impl BatchReport {
    /// Creates an empty report for a batch.
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            succeeded: 0,
            skipped: 0,
            skip_reasons: Vec::new(),
        }
    }

    /// Records a skipped item.
    pub fn skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        self.skip_reasons.push(reason);
    }

    /// Records every reason in `reasons` as skipped.
    pub fn extend_skips(&mut self, reasons: impl IntoIterator<Item = SkipReason>) {
        for reason in reasons {
            self.skip(reason);
        }
    }
}

/// A single step in the audit trace recording a calculation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}
