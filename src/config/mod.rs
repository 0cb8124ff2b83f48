//! Configuration loading and management for the Attendance Engine.
//!
//! This module provides functionality to load the attendance policy (time
//! windows, credit quotas, weekly offs) and statutory payroll rates from
//! YAML files.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Shift ends at {}", config.attendance().time_windows.shift_end);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AttendancePolicy, BonusRates, CycleQuotas, EngineConfig, EsiRates, ProfessionalTaxSlab,
    ProvidentFundRates, StatutoryRates, TimeWindows,
};
