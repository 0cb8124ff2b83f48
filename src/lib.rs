//! Attendance Engine for biometric attendance exports
//!
//! This crate turns raw biometric attendance exports into classified
//! attendance days, payroll-cycle summaries and salary records. It covers
//! the day evaluation state machine with its late/permission quotas, holiday
//! and sandwich-rule propagation, approved leave, manual overrides and salary
//! derivation with per-field overrides.
//!
//! The [`calculation`] functions are pure; the [`service`] module runs them
//! against an in-memory [`ledger`] on a bounded async worker pool.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod service;
