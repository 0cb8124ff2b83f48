//! Salary master, leave and salary record models.
//!
//! Every derived salary field is a [`TrackedAmount`] holding both the value
//! in effect and the value the last derivation produced. When the two differ
//! the field has been overridden by a human and derivation leaves it alone.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayrollCycle;

/// Effective-dated salary master snapshot for one employee.
///
/// All amounts are monthly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryMaster {
    /// The employee code.
    pub employee_id: String,
    /// First date the snapshot applies to.
    pub effective_from: NaiveDate,
    /// Basic pay.
    pub basic: Decimal,
    /// House rent allowance.
    pub hra: Decimal,
    /// City compensatory allowance.
    pub cca: Decimal,
    /// Transport allowance.
    pub transport_allowance: Decimal,
    /// Other allowance.
    pub other_allowance: Decimal,
    /// Performance linked bonus, paid as-is.
    #[serde(default)]
    pub plb: Decimal,
    /// Tax deducted at source, deducted as-is.
    #[serde(default)]
    pub tds: Decimal,
    /// Consolidated salary for employees paid outside the component structure.
    #[serde(default)]
    pub consolidated_salary: Decimal,
}

impl SalaryMaster {
    /// Selects the snapshot effective on `date`: the latest one whose
    /// `effective_from` is not after it.
    pub fn effective_on<'a>(
        masters: &'a [SalaryMaster],
        employee_id: &str,
        date: NaiveDate,
    ) -> Option<&'a SalaryMaster> {
        masters
            .iter()
            .filter(|m| m.employee_id == employee_id && m.effective_from <= date)
            .max_by_key(|m| m.effective_from)
    }
}

/// An approved leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    /// The employee code.
    pub employee_id: String,
    /// Leave type label (e.g. "annual", "business_trip", "unpaid").
    pub leave_type: String,
    /// Whether the leave is paid.
    pub is_paid: bool,
    /// First leave date (inclusive).
    pub from: NaiveDate,
    /// Last leave date (inclusive).
    pub to: NaiveDate,
    /// Approved day count; may be fractional for half-day leave.
    pub days: Decimal,
}

/// Approved leave in one cycle, split by whether it is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveClassification {
    /// Paid leave days.
    pub paid_days: Decimal,
    /// Unpaid leave days.
    pub unpaid_days: Decimal,
}

/// A derived amount together with the value the last derivation produced.
///
/// # Example
///
/// ```
/// use attendance_engine::models::TrackedAmount;
/// use rust_decimal::Decimal;
///
/// let mut net = TrackedAmount::computed(Decimal::new(25000, 0));
/// assert!(!net.is_overridden());
///
/// net.override_with(Decimal::new(26000, 0));
/// assert!(net.is_overridden());
///
/// net.clear_override();
/// assert_eq!(net.value, Decimal::new(25000, 0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAmount {
    /// The value in effect.
    pub value: Decimal,
    /// The value the last derivation produced.
    pub computed: Decimal,
}

impl TrackedAmount {
    /// A freshly derived amount.
    pub fn computed(value: Decimal) -> Self {
        Self {
            value,
            computed: value,
        }
    }

    /// Returns true if the value in effect differs from the derived one.
    pub fn is_overridden(&self) -> bool {
        self.value != self.computed
    }

    /// Sets a human-entered value.
    pub fn override_with(&mut self, value: Decimal) {
        self.value = value;
    }

    /// Drops a human-entered value so the next derivation recomputes the field.
    pub fn clear_override(&mut self) {
        self.value = self.computed;
    }
}

/// Names every overridable field of a [`SalaryRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryField {
    /// Loss-of-pay days.
    Lop,
    /// Paid days.
    DaysPaid,
    /// Prorated basic.
    Basic,
    /// Prorated HRA.
    Hra,
    /// Prorated CCA.
    Cca,
    /// Prorated transport allowance.
    TransportAllowance,
    /// Prorated other allowance.
    OtherAllowance,
    /// Prorated consolidated pay.
    ConsolidatedPay,
    /// Performance linked bonus.
    Plb,
    /// Gross pay.
    GrossPay,
    /// Employee provident fund.
    EmployeePf,
    /// Employee state insurance.
    EmployeeEsi,
    /// Professional tax.
    ProfessionalTax,
    /// Tax deducted at source.
    Tds,
    /// Sum of deductions.
    TotalDeductions,
    /// Net pay.
    NetPay,
    /// Employer provident fund.
    EmployerPf,
    /// Employer state insurance.
    EmployerEsi,
    /// Statutory bonus.
    Bonus,
    /// Cost to company.
    CostToCompany,
}

/// Payable breakdown for one employee over one payroll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRecord {
    /// The employee code.
    pub employee_id: String,
    /// The payroll cycle.
    pub cycle: PayrollCycle,
    /// Calendar length of the cycle.
    pub total_days: u32,
    /// Paid attendance days from the summary.
    pub days_worked: Decimal,
    /// Approved paid leave days in the cycle.
    pub paid_leave_days: Decimal,
    /// Approved unpaid leave days in the cycle.
    pub unpaid_leave_days: Decimal,
    /// Loss-of-pay days.
    pub lop: TrackedAmount,
    /// Paid days.
    pub days_paid: TrackedAmount,
    /// Prorated basic.
    pub basic: TrackedAmount,
    /// Prorated HRA.
    pub hra: TrackedAmount,
    /// Prorated CCA.
    pub cca: TrackedAmount,
    /// Prorated transport allowance.
    pub transport_allowance: TrackedAmount,
    /// Prorated other allowance.
    pub other_allowance: TrackedAmount,
    /// Prorated consolidated pay.
    pub consolidated_pay: TrackedAmount,
    /// Performance linked bonus.
    pub plb: TrackedAmount,
    /// Gross pay.
    pub gross_pay: TrackedAmount,
    /// Employee provident fund.
    pub employee_pf: TrackedAmount,
    /// Employee state insurance.
    pub employee_esi: TrackedAmount,
    /// Professional tax.
    pub professional_tax: TrackedAmount,
    /// Tax deducted at source.
    pub tds: TrackedAmount,
    /// Sum of deductions.
    pub total_deductions: TrackedAmount,
    /// Net pay.
    pub net_pay: TrackedAmount,
    /// Employer provident fund.
    pub employer_pf: TrackedAmount,
    /// Employer state insurance.
    pub employer_esi: TrackedAmount,
    /// Statutory bonus.
    pub bonus: TrackedAmount,
    /// Cost to company.
    pub cost_to_company: TrackedAmount,
    /// When the record was last derived.
    pub generated_at: DateTime<Utc>,
}

impl SalaryRecord {
    /// Returns a field by name.
    pub fn field(&self, field: SalaryField) -> &TrackedAmount {
        match field {
            SalaryField::Lop => &self.lop,
            SalaryField::DaysPaid => &self.days_paid,
            SalaryField::Basic => &self.basic,
            SalaryField::Hra => &self.hra,
            SalaryField::Cca => &self.cca,
            SalaryField::TransportAllowance => &self.transport_allowance,
            SalaryField::OtherAllowance => &self.other_allowance,
            SalaryField::ConsolidatedPay => &self.consolidated_pay,
            SalaryField::Plb => &self.plb,
            SalaryField::GrossPay => &self.gross_pay,
            SalaryField::EmployeePf => &self.employee_pf,
            SalaryField::EmployeeEsi => &self.employee_esi,
            SalaryField::ProfessionalTax => &self.professional_tax,
            SalaryField::Tds => &self.tds,
            SalaryField::TotalDeductions => &self.total_deductions,
            SalaryField::NetPay => &self.net_pay,
            SalaryField::EmployerPf => &self.employer_pf,
            SalaryField::EmployerEsi => &self.employer_esi,
            SalaryField::Bonus => &self.bonus,
            SalaryField::CostToCompany => &self.cost_to_company,
        }
    }

    /// Returns a field by name, mutably.
    pub fn field_mut(&mut self, field: SalaryField) -> &mut TrackedAmount {
        match field {
            SalaryField::Lop => &mut self.lop,
            SalaryField::DaysPaid => &mut self.days_paid,
            SalaryField::Basic => &mut self.basic,
            SalaryField::Hra => &mut self.hra,
            SalaryField::Cca => &mut self.cca,
            SalaryField::TransportAllowance => &mut self.transport_allowance,
            SalaryField::OtherAllowance => &mut self.other_allowance,
            SalaryField::ConsolidatedPay => &mut self.consolidated_pay,
            SalaryField::Plb => &mut self.plb,
            SalaryField::GrossPay => &mut self.gross_pay,
            SalaryField::EmployeePf => &mut self.employee_pf,
            SalaryField::EmployeeEsi => &mut self.employee_esi,
            SalaryField::ProfessionalTax => &mut self.professional_tax,
            SalaryField::Tds => &mut self.tds,
            SalaryField::TotalDeductions => &mut self.total_deductions,
            SalaryField::NetPay => &mut self.net_pay,
            SalaryField::EmployerPf => &mut self.employer_pf,
            SalaryField::EmployerEsi => &mut self.employer_esi,
            SalaryField::Bonus => &mut self.bonus,
            SalaryField::CostToCompany => &mut self.cost_to_company,
        }
    }

    /// Sets a human-entered value on a field.
    pub fn override_field(&mut self, field: SalaryField, value: Decimal) {
        self.field_mut(field).override_with(value);
    }

    /// Clears a human-entered value so the next derivation recomputes it.
    pub fn clear_override(&mut self, field: SalaryField) {
        self.field_mut(field).clear_override();
    }
}
