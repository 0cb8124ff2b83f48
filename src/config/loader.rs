//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{AttendancePolicy, EngineConfig, StatutoryRates};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── attendance.yaml   # Time windows, credit quotas, weekly offs
/// └── payroll.yaml      # PF, ESI, professional tax, bonus
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Late credits per cycle: {}", loader.config().attendance().quotas.late_per_cycle);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if either file is missing, is not valid YAML, or
    /// holds values that fail validation.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let attendance = Self::load_yaml::<AttendancePolicy>(&path.join("attendance.yaml"))?;
        attendance.validate()?;

        let statutory = Self::load_yaml::<StatutoryRates>(&path.join("payroll.yaml"))?;
        statutory.validate()?;

        debug!(path = %path.display(), "Loaded engine configuration");

        Ok(Self {
            config: EngineConfig::new(attendance, statutory),
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the attendance policy.
    pub fn attendance(&self) -> &AttendancePolicy {
        self.config.attendance()
    }

    /// Returns the statutory payroll rates.
    pub fn statutory(&self) -> &StatutoryRates {
        self.config.statutory()
    }
}
