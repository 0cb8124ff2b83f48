//! In-memory attendance ledger.
//!
//! The ledger is the engine's persistence boundary. Every aggregate is keyed
//! by its natural key and every write is an upsert, so the last writer wins
//! at the row level.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::calculation::CounterState;
use crate::models::{
    AttendanceDay, LeaveRecord, MonthlySummary, PayrollCycle, SalaryRecord, Timeline,
};

type CycleKey = (String, PayrollCycle);

/// Day rows, counters, summaries, salary records and approved leave.
#[derive(Debug, Clone, Default)]
pub struct AttendanceLedger {
    timelines: BTreeMap<String, Timeline>,
    counters: HashMap<CycleKey, CounterState>,
    summaries: BTreeMap<CycleKey, MonthlySummary>,
    salaries: BTreeMap<CycleKey, SalaryRecord>,
    leaves: BTreeMap<String, Vec<LeaveRecord>>,
}

impl AttendanceLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts one day row by `(employee_id, date)`.
    pub fn upsert_day(&mut self, day: AttendanceDay) {
        self.timelines
            .entry(day.employee_id.clone())
            .or_default()
            .insert(day.date, day);
    }

    /// Returns the row for an employee and date.
    pub fn day(&self, employee_id: &str, date: NaiveDate) -> Option<&AttendanceDay> {
        self.timelines.get(employee_id)?.get(&date)
    }

    /// Returns an employee's timeline, if they have any rows.
    pub fn timeline(&self, employee_id: &str) -> Option<&Timeline> {
        self.timelines.get(employee_id)
    }

    /// Returns an employee's timeline for editing, creating it when missing.
    pub fn timeline_mut(&mut self, employee_id: &str) -> &mut Timeline {
        self.timelines.entry(employee_id.to_string()).or_default()
    }

    /// Replaces an employee's whole timeline.
    pub fn replace_timeline(&mut self, employee_id: &str, timeline: Timeline) {
        self.timelines.insert(employee_id.to_string(), timeline);
    }

    /// Employees with any attendance history, in id order.
    pub fn employees(&self) -> Vec<String> {
        self.timelines
            .iter()
            .filter(|(_, timeline)| !timeline.is_empty())
            .map(|(employee_id, _)| employee_id.clone())
            .collect()
    }

    /// The rows of one employee that fall inside `cycle`, in date order.
    pub fn cycle_days(&self, employee_id: &str, cycle: PayrollCycle) -> Vec<AttendanceDay> {
        self.timelines
            .get(employee_id)
            .map(|timeline| {
                timeline
                    .range(cycle.start_date()..=cycle.end_date())
                    .map(|(_, day)| day.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Upserts the counters of an employee's cycle.
    pub fn upsert_counters(&mut self, employee_id: &str, cycle: PayrollCycle, state: CounterState) {
        self.counters.insert((employee_id.to_string(), cycle), state);
    }

    /// Returns the counters of an employee's cycle (zero if never written).
    pub fn counters(&self, employee_id: &str, cycle: PayrollCycle) -> CounterState {
        self.counters
            .get(&(employee_id.to_string(), cycle))
            .copied()
            .unwrap_or_default()
    }

    /// Upserts a summary by `(employee_id, cycle)`.
    pub fn upsert_summary(&mut self, summary: MonthlySummary) {
        self.summaries
            .insert((summary.employee_id.clone(), summary.cycle), summary);
    }

    /// Returns the summary of an employee's cycle.
    pub fn summary(&self, employee_id: &str, cycle: PayrollCycle) -> Option<&MonthlySummary> {
        self.summaries.get(&(employee_id.to_string(), cycle))
    }

    /// Employees that have a summary for `cycle`, in id order.
    pub fn summarized_employees(&self, cycle: PayrollCycle) -> Vec<String> {
        self.summaries
            .keys()
            .filter(|(_, c)| *c == cycle)
            .map(|(employee_id, _)| employee_id.clone())
            .collect()
    }

    /// Upserts a salary record by `(employee_id, cycle)`.
    pub fn upsert_salary(&mut self, record: SalaryRecord) {
        self.salaries
            .insert((record.employee_id.clone(), record.cycle), record);
    }

    /// Returns the salary record of an employee's cycle.
    pub fn salary(&self, employee_id: &str, cycle: PayrollCycle) -> Option<&SalaryRecord> {
        self.salaries.get(&(employee_id.to_string(), cycle))
    }

    /// Returns the salary record of an employee's cycle for editing.
    pub fn salary_mut(&mut self, employee_id: &str, cycle: PayrollCycle) -> Option<&mut SalaryRecord> {
        self.salaries.get_mut(&(employee_id.to_string(), cycle))
    }

    /// Records an approved leave. Re-recording an identical leave is a no-op.
    pub fn record_leave(&mut self, leave: LeaveRecord) {
        let records = self.leaves.entry(leave.employee_id.clone()).or_default();
        if !records.contains(&leave) {
            records.push(leave);
        }
    }

    /// Approved leave on file for an employee.
    pub fn leaves(&self, employee_id: &str) -> &[LeaveRecord] {
        self.leaves
            .get(employee_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::CycleCounters;
    use crate::models::AttendanceStatus;
    use rust_decimal::Decimal;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day(employee_id: &str, date: &str, status: AttendanceStatus) -> AttendanceDay {
        let mut day = AttendanceDay::new(employee_id, d(date));
        day.classify(status);
        day
    }

    #[test]
    fn test_upsert_day_replaces_by_natural_key() {
        let mut ledger = AttendanceLedger::new();
        ledger.upsert_day(day("E001", "2025-01-06", AttendanceStatus::Absent));
        ledger.upsert_day(day("E001", "2025-01-06", AttendanceStatus::Present));

        assert_eq!(ledger.timeline("E001").map(|t| t.len()), Some(1));
        assert_eq!(
            ledger.day("E001", d("2025-01-06")).map(|d| d.status),
            Some(AttendanceStatus::Present)
        );
    }

    #[test]
    fn test_employees_lists_only_those_with_rows() {
        let mut ledger = AttendanceLedger::new();
        ledger.upsert_day(day("E002", "2025-01-06", AttendanceStatus::Present));
        ledger.upsert_day(day("E001", "2025-01-06", AttendanceStatus::Present));
        ledger.timeline_mut("E003");

        assert_eq!(ledger.employees(), vec!["E001".to_string(), "E002".to_string()]);
    }

    #[test]
    fn test_cycle_days_respects_cycle_bounds() {
        let mut ledger = AttendanceLedger::new();
        for date in ["2024-12-20", "2024-12-21", "2025-01-20", "2025-01-21"] {
            ledger.upsert_day(day("E001", date, AttendanceStatus::Present));
        }
        let cycle = PayrollCycle::new(2025, 1).unwrap();

        let dates: Vec<_> = ledger.cycle_days("E001", cycle).iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![d("2024-12-21"), d("2025-01-20")]);
    }

    #[test]
    fn test_counters_default_to_zero_and_upsert() {
        let mut ledger = AttendanceLedger::new();
        let cycle = PayrollCycle::new(2025, 1).unwrap();
        assert_eq!(ledger.counters("E001", cycle), CounterState::default());

        let state = CounterState {
            counters: CycleCounters {
                late_used: 2,
                permission_used: 1,
            },
            last_processed: Some(d("2025-01-10")),
        };
        ledger.upsert_counters("E001", cycle, state);
        assert_eq!(ledger.counters("E001", cycle), state);
    }

    #[test]
    fn test_record_leave_deduplicates() {
        let mut ledger = AttendanceLedger::new();
        let leave = LeaveRecord {
            employee_id: "E001".to_string(),
            leave_type: "annual".to_string(),
            is_paid: true,
            from: d("2025-01-06"),
            to: d("2025-01-06"),
            days: Decimal::ONE,
        };
        ledger.record_leave(leave.clone());
        ledger.record_leave(leave);

        assert_eq!(ledger.leaves("E001").len(), 1);
        assert!(ledger.leaves("E002").is_empty());
    }
}
