//! Configuration types for attendance evaluation and payroll derivation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every structure has a
//! `Default` carrying the standard company policy, so the pure calculation
//! functions can be used without a configuration directory.

use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

fn hms(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Check-in and check-out thresholds of the working day.
///
/// All thresholds are whole-second times of day and must be strictly ascending
/// in the order they are declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindows {
    /// Latest check-in that is on time (inclusive).
    pub on_time_until: NaiveTime,
    /// Latest check-in that may be covered by a late credit (inclusive).
    pub late_until: NaiveTime,
    /// Latest check-in that may be covered by a permission credit (inclusive).
    pub permission_until: NaiveTime,
    /// Latest check-in that still earns a half day (inclusive).
    pub half_day_until: NaiveTime,
    /// Earliest check-out that may be covered by a permission credit.
    pub early_leave_from: NaiveTime,
    /// End of the working day; check-outs at or after this confirm presence.
    pub shift_end: NaiveTime,
}

impl Default for TimeWindows {
    fn default() -> Self {
        Self {
            on_time_until: hms(9, 16),
            late_until: hms(9, 30),
            permission_until: hms(11, 0),
            half_day_until: hms(13, 0),
            early_leave_from: hms(15, 30),
            shift_end: hms(17, 30),
        }
    }
}

/// Per-cycle allowance limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleQuotas {
    /// Late credits available per payroll cycle.
    pub late_per_cycle: u32,
    /// Permission credits available per payroll cycle.
    pub permission_per_cycle: u32,
}

impl Default for CycleQuotas {
    fn default() -> Self {
        Self {
            late_per_cycle: 3,
            permission_per_cycle: 2,
        }
    }
}

/// Attendance policy loaded from `attendance.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePolicy {
    /// Check-in/check-out thresholds.
    pub time_windows: TimeWindows,
    /// Late/permission credit limits.
    pub quotas: CycleQuotas,
    /// Weekdays classified as weekly off.
    pub weekly_off_days: Vec<Weekday>,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            time_windows: TimeWindows::default(),
            quotas: CycleQuotas::default(),
            weekly_off_days: vec![Weekday::Sun],
        }
    }
}

impl AttendancePolicy {
    /// Returns true if the weekday is a weekly off.
    pub fn is_weekly_off(&self, weekday: Weekday) -> bool {
        self.weekly_off_days.contains(&weekday)
    }

    /// Checks that the thresholds are strictly ascending.
    pub fn validate(&self) -> EngineResult<()> {
        let w = &self.time_windows;
        let ordered = [
            ("on_time_until", w.on_time_until),
            ("late_until", w.late_until),
            ("permission_until", w.permission_until),
            ("half_day_until", w.half_day_until),
        ];
        for pair in ordered.windows(2) {
            if pair[0].1 >= pair[1].1 {
                return Err(EngineError::InvalidConfig {
                    field: format!("time_windows.{}", pair[1].0),
                    message: format!("must be later than {}", pair[0].0),
                });
            }
        }
        if w.early_leave_from >= w.shift_end {
            return Err(EngineError::InvalidConfig {
                field: "time_windows.shift_end".to_string(),
                message: "must be later than early_leave_from".to_string(),
            });
        }
        Ok(())
    }
}

/// Provident fund contribution rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidentFundRates {
    /// Employee contribution as a fraction of the PF wage.
    pub employee_rate: Decimal,
    /// Employer contribution as a fraction of the PF wage.
    pub employer_rate: Decimal,
    /// Basic pay above this amount does not attract PF.
    pub wage_ceiling: Decimal,
}

/// Employee state insurance rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsiRates {
    /// Employee contribution as a fraction of gross pay.
    pub employee_rate: Decimal,
    /// Employer contribution as a fraction of gross pay.
    pub employer_rate: Decimal,
    /// ESI applies only while gross pay is at or below this amount.
    pub gross_ceiling: Decimal,
}

/// One professional tax slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalTaxSlab {
    /// Gross pay from which this slab applies (inclusive).
    pub min_gross: Decimal,
    /// Monthly tax for this slab.
    pub amount: Decimal,
}

/// Statutory bonus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRates {
    /// Bonus as a fraction of the bonus wage.
    pub rate: Decimal,
    /// Basic pay above this amount does not attract bonus.
    pub wage_ceiling: Decimal,
}

/// Statutory payroll rates loaded from `payroll.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryRates {
    /// Provident fund.
    pub provident_fund: ProvidentFundRates,
    /// Employee state insurance.
    pub esi: EsiRates,
    /// Professional tax slabs, any order.
    pub professional_tax: Vec<ProfessionalTaxSlab>,
    /// Statutory bonus.
    pub bonus: BonusRates,
    /// Decimal places monetary amounts are rounded to.
    pub rounding_scale: u32,
}

impl Default for StatutoryRates {
    fn default() -> Self {
        Self {
            provident_fund: ProvidentFundRates {
                employee_rate: Decimal::new(12, 2),
                employer_rate: Decimal::new(12, 2),
                wage_ceiling: Decimal::new(15000, 0),
            },
            esi: EsiRates {
                employee_rate: Decimal::new(75, 4),
                employer_rate: Decimal::new(325, 4),
                gross_ceiling: Decimal::new(21000, 0),
            },
            professional_tax: vec![
                ProfessionalTaxSlab {
                    min_gross: Decimal::ZERO,
                    amount: Decimal::ZERO,
                },
                ProfessionalTaxSlab {
                    min_gross: Decimal::new(15001, 0),
                    amount: Decimal::new(150, 0),
                },
                ProfessionalTaxSlab {
                    min_gross: Decimal::new(20001, 0),
                    amount: Decimal::new(200, 0),
                },
            ],
            bonus: BonusRates {
                rate: Decimal::new(833, 4),
                wage_ceiling: Decimal::new(7000, 0),
            },
            rounding_scale: 2,
        }
    }
}

impl StatutoryRates {
    /// Returns the professional tax owed for a gross amount.
    ///
    /// The highest slab whose `min_gross` does not exceed `gross` wins; with no
    /// matching slab the tax is zero.
    pub fn professional_tax_for(&self, gross: Decimal) -> Decimal {
        self.professional_tax
            .iter()
            .filter(|slab| slab.min_gross <= gross)
            .max_by(|a, b| a.min_gross.cmp(&b.min_gross))
            .map(|slab| slab.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Checks that rates are non-negative.
    pub fn validate(&self) -> EngineResult<()> {
        let rates = [
            ("provident_fund.employee_rate", self.provident_fund.employee_rate),
            ("provident_fund.employer_rate", self.provident_fund.employer_rate),
            ("esi.employee_rate", self.esi.employee_rate),
            ("esi.employer_rate", self.esi.employer_rate),
            ("bonus.rate", self.bonus.rate),
        ];
        for (field, rate) in rates {
            if rate.is_sign_negative() {
                return Err(EngineError::InvalidConfig {
                    field: field.to_string(),
                    message: "must not be negative".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// The complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    attendance: AttendancePolicy,
    statutory: StatutoryRates,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(attendance: AttendancePolicy, statutory: StatutoryRates) -> Self {
        Self {
            attendance,
            statutory,
        }
    }

    /// Returns the attendance policy.
    pub fn attendance(&self) -> &AttendancePolicy {
        &self.attendance
    }

    /// Returns the statutory payroll rates.
    pub fn statutory(&self) -> &StatutoryRates {
        &self.statutory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_windows_match_company_policy() {
        let windows = TimeWindows::default();
        assert_eq!(windows.on_time_until.to_string(), "09:16:00");
        assert_eq!(windows.late_until.to_string(), "09:30:00");
        assert_eq!(windows.permission_until.to_string(), "11:00:00");
        assert_eq!(windows.half_day_until.to_string(), "13:00:00");
        assert_eq!(windows.early_leave_from.to_string(), "15:30:00");
        assert_eq!(windows.shift_end.to_string(), "17:30:00");
    }

    #[test]
    fn test_default_policy_validates() {
        assert!(AttendancePolicy::default().validate().is_ok());
    }

    #[test]
    fn test_unordered_windows_rejected() {
        let mut policy = AttendancePolicy::default();
        policy.time_windows.late_until = hms(9, 0);
        match policy.validate() {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "time_windows.late_until");
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_sunday_is_default_weekly_off() {
        let policy = AttendancePolicy::default();
        assert!(policy.is_weekly_off(Weekday::Sun));
        assert!(!policy.is_weekly_off(Weekday::Sat));
    }

    #[test]
    fn test_professional_tax_picks_highest_matching_slab() {
        let rates = StatutoryRates::default();
        assert_eq!(rates.professional_tax_for(dec("10000")), Decimal::ZERO);
        assert_eq!(rates.professional_tax_for(dec("15001")), dec("150"));
        assert_eq!(rates.professional_tax_for(dec("20000")), dec("150"));
        assert_eq!(rates.professional_tax_for(dec("50000")), dec("200"));
    }

    #[test]
    fn test_professional_tax_without_slabs_is_zero() {
        let rates = StatutoryRates {
            professional_tax: vec![],
            ..StatutoryRates::default()
        };
        assert_eq!(rates.professional_tax_for(dec("50000")), Decimal::ZERO);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut rates = StatutoryRates::default();
        rates.esi.employee_rate = dec("-0.01");
        assert!(rates.validate().is_err());
    }

    #[test]
    fn test_policy_deserializes_from_yaml() {
        let yaml = r#"
time_windows:
  on_time_until: "09:16:00"
  late_until: "09:30:00"
  permission_until: "11:00:00"
  half_day_until: "13:00:00"
  early_leave_from: "15:30:00"
  shift_end: "17:30:00"
quotas:
  late_per_cycle: 3
  permission_per_cycle: 2
weekly_off_days: [Sun]
"#;
        let policy: AttendancePolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy, AttendancePolicy::default());
    }
}
