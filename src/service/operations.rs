//! Batch service operations.
//!
//! Every operation runs against an [`EngineState`], serializes on the
//! employees it touches, commits through the ledger and logs under a
//! correlation id. Row-level problems end up in the returned
//! [`BatchReport`]; only failures of the operation as a whole are errors.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{
    self, CounterState, CycleCounterStore, RawEntry, SalaryDerivation, SalaryInput,
    aggregate_cycle, apply_holiday, apply_sandwich_rule_between, classify_days, classify_leave,
    derive_salary, parse_grid, recheck_sandwich, rollback_holiday,
};
use crate::config::{AttendancePolicy, ConfigLoader};
use crate::error::{EngineError, EngineResult};
use crate::ledger::AttendanceLedger;
use crate::models::{
    AttendanceDay, BatchReport, Holiday, HolidayCalendar, LeaveRecord, MonthlySummary,
    PayrollCycle, SalaryMaster, SalaryRecord, SkipKind, SkipReason, Timeline,
};

use super::request::{IngestRequest, OverrideRequest, SalaryOverrideRequest, SalaryRequest};
use super::response::{DayChange, SalaryBatch};
use super::state::EngineState;

/// Ingests an attendance export.
///
/// The grid is parsed once, then every employee is processed on the bounded
/// worker pool: raw times are merged into the stored rows, every affected
/// cycle is re-classified from zero counters in ascending date order, the
/// sandwich rule is re-run around those cycles and their summaries are
/// recomputed. Each employee's rows, counters and summaries are committed
/// together. Re-ingesting the same export yields the same state.
///
/// `succeeded` counts the day entries committed. Unusable rows and cells,
/// and employees whose processing failed, are reported as skipped.
///
/// # Errors
///
/// Returns [`EngineError::WorkerFailed`] if the grid parser task fails.
pub async fn ingest_export(state: &EngineState, request: IngestRequest) -> EngineResult<BatchReport> {
    let batch_id = Uuid::new_v4();
    let start_time = Instant::now();
    info!(
        batch_id = %batch_id,
        rows = request.grid.len(),
        from = %request.from,
        to = %request.to,
        "Processing attendance export"
    );

    let IngestRequest { grid, from, to } = request;
    let mut parsed = tokio::task::spawn_blocking(move || parse_grid(&grid, from, to))
        .await
        .map_err(worker_failed)?;

    let mut report = BatchReport::new(batch_id);
    for reason in &parsed.skipped {
        debug!(
            batch_id = %batch_id,
            kind = ?reason.kind,
            row = ?reason.row,
            column = ?reason.column,
            detail = %reason.detail,
            "Skipped export item"
        );
    }
    let by_employee = parsed.take_by_employee();
    report.extend_skips(parsed.skipped);

    let semaphore = Arc::new(Semaphore::new(state.max_workers()));
    let mut workers = JoinSet::new();
    for (employee_id, entries) in by_employee {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| EngineError::WorkerFailed {
                message: e.to_string(),
            })?;
        let state = state.clone();
        workers.spawn(async move {
            let _permit = permit;
            let result = ingest_employee(&state, &employee_id, entries).await;
            (employee_id, result)
        });
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((_, Ok(entries))) => report.succeeded += entries,
            Ok((employee_id, Err(err))) => {
                warn!(
                    batch_id = %batch_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Employee ingestion failed"
                );
                report.skip(
                    SkipReason::new(SkipKind::EmployeeFailed, err.to_string())
                        .for_employee(employee_id),
                );
            }
            Err(err) => {
                warn!(batch_id = %batch_id, error = %err, "Ingestion worker failed");
                report.skip(SkipReason::new(
                    SkipKind::EmployeeFailed,
                    format!("worker failed: {err}"),
                ));
            }
        }
    }

    info!(
        batch_id = %batch_id,
        succeeded = report.succeeded,
        skipped = report.skipped,
        duration_us = start_time.elapsed().as_micros(),
        "Attendance export processed"
    );
    Ok(report)
}

/// What one employee's ingestion produces before it is committed.
struct Reconciled {
    timeline: Timeline,
    counters: Vec<(PayrollCycle, CounterState)>,
    summaries: Vec<MonthlySummary>,
    entries: usize,
}

async fn ingest_employee(
    state: &EngineState,
    employee_id: &str,
    entries: Vec<RawEntry>,
) -> EngineResult<usize> {
    // Held through the commit; holiday edits take it for writing.
    let calendar_guard = state.calendar().read().await;
    let _guard = state.locks().acquire(employee_id).await;

    let timeline = state
        .ledger()
        .lock()
        .await
        .timeline(employee_id)
        .cloned()
        .unwrap_or_default();
    let calendar = calendar_guard.clone();
    let policy = state.config().attendance().clone();
    let owner = employee_id.to_string();

    let reconciled = tokio::task::spawn_blocking(move || {
        reconcile_employee(&owner, timeline, &entries, &calendar, &policy, Utc::now())
    })
    .await
    .map_err(worker_failed)??;

    let mut ledger = state.ledger().lock().await;
    ledger.replace_timeline(employee_id, reconciled.timeline);
    for (cycle, counters) in reconciled.counters {
        ledger.upsert_counters(employee_id, cycle, counters);
    }
    for summary in reconciled.summaries {
        ledger.upsert_summary(summary);
    }
    drop(ledger);
    drop(calendar_guard);
    Ok(reconciled.entries)
}

fn reconcile_employee(
    employee_id: &str,
    mut timeline: Timeline,
    entries: &[RawEntry],
    calendar: &HolidayCalendar,
    policy: &AttendancePolicy,
    computed_at: DateTime<Utc>,
) -> EngineResult<Reconciled> {
    let mut cycles = BTreeSet::new();
    for entry in entries {
        timeline
            .entry(entry.date)
            .and_modify(|day| entry.merge_into(day))
            .or_insert_with(|| entry.to_day());
        cycles.insert(PayrollCycle::for_date(entry.date));
    }

    let mut store = CycleCounterStore::new();
    for cycle in &cycles {
        let mut days: Vec<AttendanceDay> = timeline
            .range(cycle.start_date()..=cycle.end_date())
            .map(|(_, day)| day.clone())
            .collect();
        classify_days(&mut days, calendar, policy, &mut store)?;
        timeline.extend(days.into_iter().map(|day| (day.date, day)));
    }

    // A row's sandwich depends on rows up to two days away.
    let mut touched = cycles.clone();
    for cycle in &cycles {
        let from = cycle.start_date() - Duration::days(2);
        let to = cycle.end_date() + Duration::days(2);
        for date in apply_sandwich_rule_between(&mut timeline, from, to) {
            touched.insert(PayrollCycle::for_date(date));
        }
    }

    let summaries = touched
        .iter()
        .map(|cycle| summarize(employee_id, *cycle, &timeline, computed_at))
        .collect::<EngineResult<Vec<_>>>()?;
    let counters = cycles
        .iter()
        .map(|cycle| (*cycle, store.state(employee_id, *cycle)))
        .collect();

    Ok(Reconciled {
        timeline,
        counters,
        summaries,
        entries: entries.len(),
    })
}

fn summarize(
    employee_id: &str,
    cycle: PayrollCycle,
    timeline: &Timeline,
    computed_at: DateTime<Utc>,
) -> EngineResult<MonthlySummary> {
    let days: Vec<AttendanceDay> = timeline
        .range(cycle.start_date()..=cycle.end_date())
        .map(|(_, day)| day.clone())
        .collect();
    aggregate_cycle(employee_id, cycle, &days, computed_at)
}

/// Recomputes the summaries of every cycle containing one of `dates`.
fn refresh_summaries(
    ledger: &mut AttendanceLedger,
    employee_id: &str,
    dates: impl IntoIterator<Item = NaiveDate>,
    computed_at: DateTime<Utc>,
) -> EngineResult<()> {
    let cycles: BTreeSet<PayrollCycle> = dates.into_iter().map(PayrollCycle::for_date).collect();
    for cycle in cycles {
        let summary = match ledger.timeline(employee_id) {
            Some(timeline) => summarize(employee_id, cycle, timeline, computed_at)?,
            None => aggregate_cycle(employee_id, cycle, &[], computed_at)?,
        };
        ledger.upsert_summary(summary);
    }
    Ok(())
}

/// Adds a holiday and applies it to every employee with attendance history.
///
/// `succeeded` counts the employees whose rows changed. Re-applying the same
/// holiday changes nothing.
pub async fn add_holiday(state: &EngineState, holiday: Holiday) -> EngineResult<BatchReport> {
    let batch_id = Uuid::new_v4();
    let date = holiday.date;
    info!(batch_id = %batch_id, date = %date, title = %holiday.title, "Applying holiday");

    let mut calendar = state.calendar().write().await;
    calendar.insert(holiday);
    let report = propagate_holiday(state, batch_id, &[date], |employee_id, timeline| {
        if apply_holiday(employee_id, timeline, date) {
            vec![date]
        } else {
            Vec::new()
        }
    })
    .await;
    drop(calendar);
    report
}

/// Moves a holiday to another date (and possibly renames it).
///
/// Every employee's old date is rolled back and the new date applied.
pub async fn update_holiday(
    state: &EngineState,
    old_date: NaiveDate,
    holiday: Holiday,
) -> EngineResult<BatchReport> {
    let batch_id = Uuid::new_v4();
    let new_date = holiday.date;
    info!(
        batch_id = %batch_id,
        old_date = %old_date,
        new_date = %new_date,
        title = %holiday.title,
        "Updating holiday"
    );

    let mut calendar = state.calendar().write().await;
    calendar.remove(old_date);
    calendar.insert(holiday);
    let report = propagate_holiday(state, batch_id, &[old_date, new_date], |employee_id, timeline| {
        calculation::update_holiday(employee_id, timeline, old_date, new_date)
    })
    .await;
    drop(calendar);
    report
}

/// Deletes a holiday and rolls it back for every employee.
///
/// Rows return to the status they had before the holiday was applied
/// (Absent when none was captured). The day is not re-evaluated from its
/// raw times; a later ingestion of the cycle does that.
pub async fn delete_holiday(state: &EngineState, date: NaiveDate) -> EngineResult<BatchReport> {
    let batch_id = Uuid::new_v4();
    info!(batch_id = %batch_id, date = %date, "Rolling back holiday");

    let mut calendar = state.calendar().write().await;
    if calendar.remove(date).is_none() {
        warn!(batch_id = %batch_id, date = %date, "Holiday was not in the calendar");
    }
    let report = propagate_holiday(state, batch_id, &[date], |_, timeline| {
        if rollback_holiday(timeline, date) {
            vec![date]
        } else {
            Vec::new()
        }
    })
    .await;
    drop(calendar);
    report
}

/// Applies a calendar change to every employee with attendance history.
///
/// Callers hold the calendar write lock for the whole call; employee locks
/// are taken after it, the same order ingestion uses.
async fn propagate_holiday<F>(
    state: &EngineState,
    batch_id: Uuid,
    anchors: &[NaiveDate],
    change: F,
) -> EngineResult<BatchReport>
where
    F: Fn(&str, &mut Timeline) -> Vec<NaiveDate>,
{
    let start_time = Instant::now();
    let employees = state.ledger().lock().await.employees();
    let _guards = state.locks().acquire_all(&employees).await;
    let mut ledger = state.ledger().lock().await;
    let computed_at = Utc::now();
    let mut report = BatchReport::new(batch_id);

    for employee_id in &employees {
        let timeline = ledger.timeline_mut(employee_id);
        let mut changed = change(employee_id, timeline);
        for anchor in anchors {
            changed.extend(recheck_sandwich(timeline, *anchor));
        }
        if changed.is_empty() {
            continue;
        }
        changed.sort_unstable();
        changed.dedup();

        match refresh_summaries(&mut ledger, employee_id, changed, computed_at) {
            Ok(()) => report.succeeded += 1,
            Err(err) => {
                warn!(
                    batch_id = %batch_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Holiday propagation failed"
                );
                report.skip(
                    SkipReason::new(SkipKind::EmployeeFailed, err.to_string())
                        .for_employee(employee_id.clone()),
                );
            }
        }
    }

    info!(
        batch_id = %batch_id,
        employees = employees.len(),
        changed = report.succeeded,
        duration_us = start_time.elapsed().as_micros(),
        "Holiday propagated"
    );
    Ok(report)
}

/// Records an approved leave and marks its working days as Leave.
///
/// The sandwich rule is re-run around the leave and the affected cycles are
/// re-aggregated. Returns every date whose status changed.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the leave ends before it starts.
pub async fn apply_leave(state: &EngineState, leave: LeaveRecord) -> EngineResult<Vec<NaiveDate>> {
    if leave.to < leave.from {
        return Err(EngineError::CalculationError {
            message: format!(
                "leave for '{}' ends on {} before it starts on {}",
                leave.employee_id, leave.to, leave.from
            ),
        });
    }

    let calendar = state.calendar().read().await;
    let _guard = state.locks().acquire(&leave.employee_id).await;
    let mut ledger = state.ledger().lock().await;

    let timeline = ledger.timeline_mut(&leave.employee_id);
    let mut changed =
        calculation::apply_leave(timeline, &leave, state.config().attendance(), &calendar);
    changed.extend(apply_sandwich_rule_between(
        timeline,
        leave.from - Duration::days(2),
        leave.to + Duration::days(2),
    ));
    changed.sort_unstable();
    changed.dedup();

    refresh_summaries(&mut ledger, &leave.employee_id, changed.clone(), Utc::now())?;
    info!(
        employee_id = %leave.employee_id,
        leave_type = %leave.leave_type,
        from = %leave.from,
        to = %leave.to,
        changed = changed.len(),
        "Approved leave applied"
    );
    ledger.record_leave(leave);
    Ok(changed)
}

/// Applies a human correction to one day.
///
/// The row is locked against every automatic path, the sandwich rule is
/// re-checked around it and its cycle summary is recomputed.
///
/// # Errors
///
/// Returns [`EngineError::DayNotFound`] if the employee has no row on the date.
pub async fn override_day(state: &EngineState, request: OverrideRequest) -> EngineResult<DayChange> {
    let OverrideRequest {
        employee_id,
        date,
        status,
        reason,
        changed_by,
    } = request;
    let not_found = || EngineError::DayNotFound {
        employee_id: employee_id.clone(),
        date,
    };

    let _guard = state.locks().acquire(&employee_id).await;
    let mut ledger = state.ledger().lock().await;

    let timeline = ledger.timeline_mut(&employee_id);
    let day = timeline.get_mut(&date).ok_or_else(not_found)?;
    let previous = day.status;
    day.apply_manual_override(status, reason, changed_by.clone(), Utc::now());

    let mut changed = recheck_sandwich(timeline, date);
    if previous != status {
        changed.push(date);
    }
    changed.sort_unstable();
    changed.dedup();
    let day = timeline.get(&date).cloned().ok_or_else(not_found)?;

    let mut refresh = changed.clone();
    refresh.push(date);
    refresh_summaries(&mut ledger, &employee_id, refresh, Utc::now())?;

    info!(
        employee_id = %employee_id,
        date = %date,
        from = %previous,
        to = %status,
        changed_by = %changed_by,
        "Manual override applied"
    );
    Ok(DayChange {
        day,
        changed_dates: changed,
    })
}

/// Derives (or re-derives) one employee's salary for a cycle.
///
/// Manually overridden fields of the stored record are kept.
///
/// # Errors
///
/// Returns [`EngineError::SummaryNotFound`] if the cycle has not been
/// aggregated, or [`EngineError::SalaryMasterNotFound`] if no snapshot is
/// effective on the cycle's end date.
pub async fn generate_salary(
    state: &EngineState,
    employee_id: &str,
    cycle: PayrollCycle,
    masters: &[SalaryMaster],
) -> EngineResult<SalaryDerivation> {
    let calendar = state.calendar().read().await;
    let _guard = state.locks().acquire(employee_id).await;
    let mut ledger = state.ledger().lock().await;

    let derivation = derive_for(
        &ledger,
        state.config(),
        &calendar,
        employee_id,
        cycle,
        masters,
        Utc::now(),
    )?;
    ledger.upsert_salary(derivation.record.clone());
    Ok(derivation)
}

/// Derives salaries for every employee with a summary in the cycle.
///
/// Employees without an effective salary master are skipped and reported.
pub async fn generate_salaries(
    state: &EngineState,
    request: SalaryRequest,
) -> EngineResult<SalaryBatch> {
    let batch_id = Uuid::new_v4();
    let start_time = Instant::now();
    let SalaryRequest { cycle, masters } = request;
    info!(batch_id = %batch_id, cycle = %cycle, masters = masters.len(), "Generating salaries");

    let calendar = state.calendar().read().await;
    let employees = state.ledger().lock().await.summarized_employees(cycle);
    let _guards = state.locks().acquire_all(&employees).await;
    let mut ledger = state.ledger().lock().await;
    let generated_at = Utc::now();

    let mut report = BatchReport::new(batch_id);
    let mut records = Vec::new();
    let mut audit = BTreeMap::new();
    for employee_id in employees {
        let derived = derive_for(
            &ledger,
            state.config(),
            &calendar,
            &employee_id,
            cycle,
            &masters,
            generated_at,
        );
        match derived {
            Ok(derivation) => {
                ledger.upsert_salary(derivation.record.clone());
                records.push(derivation.record);
                audit.insert(employee_id, derivation.audit_steps);
                report.succeeded += 1;
            }
            Err(err) => {
                let kind = match &err {
                    EngineError::SalaryMasterNotFound { .. } => SkipKind::MissingSalaryMaster,
                    _ => SkipKind::EmployeeFailed,
                };
                warn!(
                    batch_id = %batch_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Salary skipped"
                );
                report.skip(SkipReason::new(kind, err.to_string()).for_employee(employee_id));
            }
        }
    }

    info!(
        batch_id = %batch_id,
        succeeded = report.succeeded,
        skipped = report.skipped,
        duration_us = start_time.elapsed().as_micros(),
        "Salaries generated"
    );
    Ok(SalaryBatch {
        report,
        records,
        audit,
    })
}

fn derive_for(
    ledger: &AttendanceLedger,
    config: &ConfigLoader,
    calendar: &HolidayCalendar,
    employee_id: &str,
    cycle: PayrollCycle,
    masters: &[SalaryMaster],
    generated_at: DateTime<Utc>,
) -> EngineResult<SalaryDerivation> {
    let summary = ledger
        .summary(employee_id, cycle)
        .ok_or_else(|| EngineError::SummaryNotFound {
            employee_id: employee_id.to_string(),
            cycle: cycle.to_string(),
        })?;
    let master = SalaryMaster::effective_on(masters, employee_id, cycle.end_date()).ok_or_else(
        || EngineError::SalaryMasterNotFound {
            employee_id: employee_id.to_string(),
            date: cycle.end_date(),
        },
    )?;

    let input = SalaryInput {
        summary,
        leave: classify_leave(
            employee_id,
            cycle,
            ledger.leaves(employee_id),
            config.attendance(),
            calendar,
        ),
        master,
    };
    derive_salary(
        &input,
        ledger.salary(employee_id, cycle),
        config.statutory(),
        generated_at,
    )
}

/// Sets or clears a human-entered value on a stored salary record.
///
/// # Errors
///
/// Returns [`EngineError::SalaryRecordNotFound`] if no record was derived yet.
pub async fn override_salary(
    state: &EngineState,
    request: SalaryOverrideRequest,
) -> EngineResult<SalaryRecord> {
    let _guard = state.locks().acquire(&request.employee_id).await;
    let mut ledger = state.ledger().lock().await;

    let record = ledger
        .salary_mut(&request.employee_id, request.cycle)
        .ok_or_else(|| EngineError::SalaryRecordNotFound {
            employee_id: request.employee_id.clone(),
            cycle: request.cycle.to_string(),
        })?;
    match request.value {
        Some(value) => record.override_field(request.field, value),
        None => record.clear_override(request.field),
    }

    info!(
        employee_id = %request.employee_id,
        cycle = %request.cycle,
        field = ?request.field,
        value = ?request.value,
        "Salary field override updated"
    );
    Ok(record.clone())
}

/// Returns one stored attendance row.
pub async fn attendance_day(
    state: &EngineState,
    employee_id: &str,
    date: NaiveDate,
) -> Option<AttendanceDay> {
    state.ledger().lock().await.day(employee_id, date).cloned()
}

/// Returns the stored rows of an employee's cycle, in date order.
pub async fn cycle_days(
    state: &EngineState,
    employee_id: &str,
    cycle: PayrollCycle,
) -> Vec<AttendanceDay> {
    state.ledger().lock().await.cycle_days(employee_id, cycle)
}

/// Returns the counters of an employee's cycle.
pub async fn cycle_counters(
    state: &EngineState,
    employee_id: &str,
    cycle: PayrollCycle,
) -> CounterState {
    state.ledger().lock().await.counters(employee_id, cycle)
}

/// Returns the summary of an employee's cycle.
///
/// # Errors
///
/// Returns [`EngineError::SummaryNotFound`] if the cycle has not been aggregated.
pub async fn monthly_summary(
    state: &EngineState,
    employee_id: &str,
    cycle: PayrollCycle,
) -> EngineResult<MonthlySummary> {
    state
        .ledger()
        .lock()
        .await
        .summary(employee_id, cycle)
        .cloned()
        .ok_or_else(|| EngineError::SummaryNotFound {
            employee_id: employee_id.to_string(),
            cycle: cycle.to_string(),
        })
}

/// Returns the stored salary record of an employee's cycle.
///
/// # Errors
///
/// Returns [`EngineError::SalaryRecordNotFound`] if no record was derived yet.
pub async fn salary_record(
    state: &EngineState,
    employee_id: &str,
    cycle: PayrollCycle,
) -> EngineResult<SalaryRecord> {
    state
        .ledger()
        .lock()
        .await
        .salary(employee_id, cycle)
        .cloned()
        .ok_or_else(|| EngineError::SalaryRecordNotFound {
            employee_id: employee_id.to_string(),
            cycle: cycle.to_string(),
        })
}

fn worker_failed(err: tokio::task::JoinError) -> EngineError {
    EngineError::WorkerFailed {
        message: err.to_string(),
    }
}
