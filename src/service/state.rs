//! Shared engine state for the batch service.
//!
//! This module defines the state every service operation runs against.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::ConfigLoader;
use crate::ledger::AttendanceLedger;
use crate::models::HolidayCalendar;

use super::locks::EmployeeLocks;

const DEFAULT_MAX_WORKERS: usize = 4;

/// Shared engine state.
///
/// Cloning is cheap; every clone points at the same ledger, calendar and
/// lock table.
///
/// Locks are taken in the order calendar, employee locks, ledger.
#[derive(Clone)]
pub struct EngineState {
    /// The loaded engine configuration.
    config: Arc<ConfigLoader>,
    ledger: Arc<Mutex<AttendanceLedger>>,
    calendar: Arc<RwLock<HolidayCalendar>>,
    locks: EmployeeLocks,
    max_workers: usize,
}

impl EngineState {
    /// Creates a new engine state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        let max_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(DEFAULT_MAX_WORKERS);
        Self {
            config: Arc::new(config),
            ledger: Arc::new(Mutex::new(AttendanceLedger::new())),
            calendar: Arc::new(RwLock::new(HolidayCalendar::default())),
            locks: EmployeeLocks::new(),
            max_workers,
        }
    }

    /// Sets the number of employees processed concurrently (at least one).
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Starts from an existing holiday calendar.
    pub fn with_calendar(mut self, calendar: HolidayCalendar) -> Self {
        self.calendar = Arc::new(RwLock::new(calendar));
        self
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the ledger.
    pub fn ledger(&self) -> &Mutex<AttendanceLedger> {
        &self.ledger
    }

    /// Returns the holiday calendar.
    pub fn calendar(&self) -> &RwLock<HolidayCalendar> {
        &self.calendar
    }

    /// Returns the per-employee lock table.
    pub fn locks(&self) -> &EmployeeLocks {
        &self.locks
    }

    /// Returns the worker pool size.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}
