//! Error types for the Attendance Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during attendance evaluation
//! and payroll derivation. Row-level ingestion problems are not errors;
//! they are collected into a [`BatchReport`](crate::models::BatchReport).

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the Attendance Engine.
///
/// # Example
///
/// ```
/// use attendance_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/attendance.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/attendance.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but holds values the engine cannot work with.
    #[error("Invalid configuration value '{field}': {message}")]
    InvalidConfig {
        /// The offending configuration key.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A day was submitted to the counter tracker out of chronological order.
    #[error(
        "Day {date} for employee '{employee_id}' submitted out of order (last processed {last_processed})"
    )]
    OutOfOrderDay {
        /// The employee whose days were out of order.
        employee_id: String,
        /// The rejected date.
        date: NaiveDate,
        /// The most recent date already processed in the same cycle.
        last_processed: NaiveDate,
    },

    /// No attendance row exists for the employee and date.
    #[error("No attendance record for employee '{employee_id}' on {date}")]
    DayNotFound {
        /// The employee identifier.
        employee_id: String,
        /// The requested date.
        date: NaiveDate,
    },

    /// No monthly summary exists for the employee and payroll cycle.
    #[error("No monthly summary for employee '{employee_id}' in cycle {cycle}")]
    SummaryNotFound {
        /// The employee identifier.
        employee_id: String,
        /// The payroll cycle key, formatted as `YYYY-MM`.
        cycle: String,
    },

    /// No salary master snapshot is effective for the employee and cycle.
    #[error("No salary master effective for employee '{employee_id}' on {date}")]
    SalaryMasterNotFound {
        /// The employee identifier.
        employee_id: String,
        /// The date the snapshot had to be effective on.
        date: NaiveDate,
    },

    /// No salary record has been derived for the employee and payroll cycle.
    #[error("No salary record for employee '{employee_id}' in cycle {cycle}")]
    SalaryRecordNotFound {
        /// The employee identifier.
        employee_id: String,
        /// The payroll cycle key, formatted as `YYYY-MM`.
        cycle: String,
    },

    /// Summary counts do not add up to the cycle length.
    #[error("Aggregation inconsistency for employee '{employee_id}' in cycle {cycle}: {message}")]
    AggregationInconsistency {
        /// The employee identifier.
        employee_id: String,
        /// The payroll cycle key, formatted as `YYYY-MM`.
        cycle: String,
        /// What did not add up.
        message: String,
    },

    /// A payroll cycle key does not denote a real month.
    #[error("Invalid payroll cycle {year}-{month}")]
    InvalidCycle {
        /// The cycle year.
        year: i32,
        /// The cycle month.
        month: u32,
    },

    /// A background worker panicked or was cancelled.
    #[error("Worker failed: {message}")]
    WorkerFailed {
        /// A description of the failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/attendance.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/attendance.yaml"
        );
    }

    #[test]
    fn test_out_of_order_day_displays_dates() {
        let error = EngineError::OutOfOrderDay {
            employee_id: "E001".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            last_processed: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "Day 2025-01-03 for employee 'E001' submitted out of order (last processed 2025-01-05)"
        );
    }

    #[test]
    fn test_salary_master_not_found_displays_employee_and_date() {
        let error = EngineError::SalaryMasterNotFound {
            employee_id: "E001".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "No salary master effective for employee 'E001' on 2025-01-20"
        );
    }

    #[test]
    fn test_aggregation_inconsistency_displays_cycle() {
        let error = EngineError::AggregationInconsistency {
            employee_id: "E001".to_string(),
            cycle: "2025-01".to_string(),
            message: "30 != 31".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Aggregation inconsistency for employee 'E001' in cycle 2025-01: 30 != 31"
        );
    }

    #[test]
    fn test_invalid_config_displays_field_and_message() {
        let error = EngineError::InvalidConfig {
            field: "cycle_start_day".to_string(),
            message: "must be between 2 and 28".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value 'cycle_start_day': must be between 2 and 28"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_day_not_found() -> EngineResult<()> {
            Err(EngineError::DayNotFound {
                employee_id: "E001".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_day_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
