//! Per-cycle late/permission counters.
//!
//! [`CycleCounterStore`] owns the `(employee, cycle) → counters` mapping and
//! is the only way days reach the evaluator in a batch. It enforces strictly
//! ascending dates per employee and cycle and commits credits only for days
//! that resolve to Present.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::AttendancePolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::PayrollCycle;

use super::day_evaluation::{DayEvaluation, DayInput, evaluate_day};

/// Late and permission credits consumed in one payroll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCounters {
    /// Late credits used.
    pub late_used: u32,
    /// Permission credits used.
    pub permission_used: u32,
}

impl CycleCounters {
    /// Adds the credits an evaluation commits.
    pub fn commit(&mut self, evaluation: &DayEvaluation) {
        let (late, permission) = evaluation.committed_credits();
        self.late_used += late;
        self.permission_used += permission;
    }
}

/// Counters for one `(employee, cycle)` plus the last date they covered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// The counters.
    pub counters: CycleCounters,
    /// The most recent date processed in the cycle.
    pub last_processed: Option<NaiveDate>,
}

/// Stateful tracker feeding days to the evaluator in order.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{CycleCounterStore, DayInput};
/// use attendance_engine::config::AttendancePolicy;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let policy = AttendancePolicy::default();
/// let mut store = CycleCounterStore::new();
/// let late = DayInput {
///     time_in: NaiveTime::from_hms_opt(9, 20, 0),
///     time_out: NaiveTime::from_hms_opt(17, 30, 0),
///     is_weekly_off: false,
///     is_holiday: false,
/// };
///
/// let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
/// store.classify("E001", monday, &late, &policy).unwrap();
///
/// // Going back in time is rejected.
/// let sunday = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
/// assert!(store.classify("E001", sunday, &late, &policy).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CycleCounterStore {
    states: HashMap<(String, PayrollCycle), CounterState>,
}

impl CycleCounterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counters for an employee's cycle (zero if never touched).
    pub fn snapshot(&self, employee_id: &str, cycle: PayrollCycle) -> CycleCounters {
        self.state(employee_id, cycle).counters
    }

    /// Returns the full state for an employee's cycle.
    pub fn state(&self, employee_id: &str, cycle: PayrollCycle) -> CounterState {
        self.states
            .get(&(employee_id.to_string(), cycle))
            .copied()
            .unwrap_or_default()
    }

    /// Evaluates one day and commits its credits.
    ///
    /// The read of the counters, the evaluation and the commit happen as one
    /// unit. Dates must be strictly ascending per employee and cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfOrderDay`] if `date` is not after the last
    /// date processed for the same employee and cycle. The store is unchanged.
    pub fn classify(
        &mut self,
        employee_id: &str,
        date: NaiveDate,
        input: &DayInput,
        policy: &AttendancePolicy,
    ) -> EngineResult<DayEvaluation> {
        let state = self.advance(employee_id, date)?;
        let evaluation = evaluate_day(input, state.counters, policy);
        state.counters.commit(&evaluation);
        Ok(evaluation)
    }

    /// Marks a date as processed without evaluating it.
    ///
    /// Used for rows whose status is fixed (manual edits, approved leave).
    pub fn pass(&mut self, employee_id: &str, date: NaiveDate) -> EngineResult<()> {
        self.advance(employee_id, date).map(|_| ())
    }

    fn advance(&mut self, employee_id: &str, date: NaiveDate) -> EngineResult<&mut CounterState> {
        let cycle = PayrollCycle::for_date(date);
        let state = self
            .states
            .entry((employee_id.to_string(), cycle))
            .or_default();
        if let Some(last_processed) = state.last_processed {
            if date <= last_processed {
                return Err(EngineError::OutOfOrderDay {
                    employee_id: employee_id.to_string(),
                    date,
                    last_processed,
                });
            }
        }
        state.last_processed = Some(date);
        Ok(state)
    }
}
