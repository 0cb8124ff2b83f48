//! Salary derivation.
//!
//! Turns a cycle summary, the cycle's paid/unpaid leave split and the salary
//! master into a [`SalaryRecord`]. Each field is derived from the *effective*
//! values of the fields it depends on, and a field whose previous value was
//! overridden by a human keeps that value. The fresh formula result is still
//! stored as `computed`, so clearing the override later falls back to it.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::StatutoryRates;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, LeaveClassification, MonthlySummary, SalaryField, SalaryMaster, SalaryRecord,
    TrackedAmount,
};

/// Everything a salary derivation reads.
#[derive(Debug, Clone, Copy)]
pub struct SalaryInput<'a> {
    /// The cycle summary.
    pub summary: &'a MonthlySummary,
    /// Approved leave in the cycle.
    pub leave: LeaveClassification,
    /// The salary master snapshot effective for the cycle.
    pub master: &'a SalaryMaster,
}

/// A derived salary record and the steps that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryDerivation {
    /// The record.
    pub record: SalaryRecord,
    /// One step per derived field, in derivation order.
    pub audit_steps: Vec<AuditStep>,
}

struct Deriver<'a> {
    previous: Option<&'a SalaryRecord>,
    steps: Vec<AuditStep>,
}

impl Deriver<'_> {
    fn track(
        &mut self,
        field: SalaryField,
        rule_id: &str,
        rule_name: &str,
        computed: Decimal,
        input: Value,
        formula: String,
    ) -> TrackedAmount {
        let previous = self.previous.map(|r| *r.field(field));
        let amount = match previous {
            Some(prev) if prev.is_overridden() => TrackedAmount {
                value: prev.value,
                computed,
            },
            _ => TrackedAmount::computed(computed),
        };

        let reasoning = if amount.is_overridden() {
            format!(
                "{formula}; manual value {} kept",
                amount.value.normalize()
            )
        } else {
            formula
        };

        self.steps.push(AuditStep {
            step_number: self.steps.len() as u32 + 1,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output: json!({
                "value": amount.value.normalize().to_string(),
                "computed": amount.computed.normalize().to_string(),
                "overridden": amount.is_overridden(),
            }),
            reasoning,
        });
        amount
    }
}

fn money(amount: Decimal, rates: &StatutoryRates) -> Decimal {
    amount.round_dp_with_strategy(rates.rounding_scale, RoundingStrategy::MidpointAwayFromZero)
}

fn text(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Derives a salary record.
///
/// `previous` is the record stored for the same employee and cycle, if any;
/// its overridden fields survive this derivation.
///
/// # Formulas
///
/// - `lop = max(total_days - days_worked - paid_leave, 0)`
/// - `days_paid = total_days - lop`
/// - each component = `master / total_days * days_paid`
/// - `gross = components + plb`
/// - PF = rate × min(basic, ceiling); ESI = ⌈rate × gross⌉ while gross is at
///   or below the ESI ceiling; professional tax from the slab table
/// - `net = gross - (pf + esi + pt + tds)`
/// - bonus = rate × min(basic, ceiling); `ctc = gross + employer pf + employer esi + bonus`
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the summary has a zero-day
/// cycle.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{derive_salary, SalaryInput};
/// use attendance_engine::config::StatutoryRates;
/// use attendance_engine::models::{LeaveClassification, MonthlySummary, PayrollCycle, SalaryMaster};
/// use chrono::{NaiveDate, Utc};
/// use rust_decimal::Decimal;
///
/// let summary = MonthlySummary {
///     employee_id: "E001".to_string(),
///     cycle: PayrollCycle::new(2025, 1).unwrap(),
///     total_present: Decimal::from(20),
///     total_absent: Decimal::from(6),
///     total_leave_taken: Decimal::from(2),
///     total_weekly_off: Decimal::from(5),
///     total_holiday: Decimal::ZERO,
///     worked_weekly_off: Decimal::ZERO,
///     missing_days: 0,
///     total_days: 31,
///     days_worked: Decimal::from(25),
///     computed_at: Utc::now(),
/// };
/// let master = SalaryMaster {
///     employee_id: "E001".to_string(),
///     effective_from: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
///     basic: Decimal::from(31000),
///     hra: Decimal::ZERO,
///     cca: Decimal::ZERO,
///     transport_allowance: Decimal::ZERO,
///     other_allowance: Decimal::ZERO,
///     plb: Decimal::ZERO,
///     tds: Decimal::ZERO,
///     consolidated_salary: Decimal::ZERO,
/// };
/// let input = SalaryInput {
///     summary: &summary,
///     leave: LeaveClassification { paid_days: Decimal::from(2), unpaid_days: Decimal::ZERO },
///     master: &master,
/// };
///
/// let derived = derive_salary(&input, None, &StatutoryRates::default(), Utc::now()).unwrap();
/// assert_eq!(derived.record.lop.value, Decimal::from(4));
/// assert_eq!(derived.record.days_paid.value, Decimal::from(27));
/// assert_eq!(derived.record.basic.value, Decimal::from(27000));
/// ```
pub fn derive_salary(
    input: &SalaryInput<'_>,
    previous: Option<&SalaryRecord>,
    rates: &StatutoryRates,
    generated_at: DateTime<Utc>,
) -> EngineResult<SalaryDerivation> {
    let summary = input.summary;
    let master = input.master;
    if summary.total_days == 0 {
        return Err(EngineError::CalculationError {
            message: format!(
                "cycle {} for employee '{}' has no days",
                summary.cycle, summary.employee_id
            ),
        });
    }
    let total_days = Decimal::from(summary.total_days);
    let mut d = Deriver {
        previous,
        steps: Vec::new(),
    };

    // Days
    let lop_raw = total_days - summary.days_worked - input.leave.paid_days;
    let lop = d.track(
        SalaryField::Lop,
        "lop_days",
        "Loss of Pay Days",
        lop_raw.max(Decimal::ZERO),
        json!({
            "total_days": summary.total_days,
            "days_worked": text(summary.days_worked),
            "paid_leave_days": text(input.leave.paid_days),
        }),
        format!(
            "max({} - {} - {}, 0)",
            total_days,
            text(summary.days_worked),
            text(input.leave.paid_days)
        ),
    );
    let days_paid = d.track(
        SalaryField::DaysPaid,
        "days_paid",
        "Paid Days",
        (total_days - lop.value).max(Decimal::ZERO),
        json!({ "total_days": summary.total_days, "lop": text(lop.value) }),
        format!("{} - {}", total_days, text(lop.value)),
    );

    // Prorated components
    let mut prorate = |field: SalaryField, rule_id: &str, rule_name: &str, monthly: Decimal| {
        let amount = money(monthly / total_days * days_paid.value, rates);
        d.track(
            field,
            rule_id,
            rule_name,
            amount,
            json!({
                "monthly": text(monthly),
                "total_days": summary.total_days,
                "days_paid": text(days_paid.value),
            }),
            format!("{} / {} * {}", text(monthly), total_days, text(days_paid.value)),
        )
    };
    let basic = prorate(SalaryField::Basic, "prorate_basic", "Prorated Basic", master.basic);
    let hra = prorate(SalaryField::Hra, "prorate_hra", "Prorated HRA", master.hra);
    let cca = prorate(SalaryField::Cca, "prorate_cca", "Prorated CCA", master.cca);
    let transport_allowance = prorate(
        SalaryField::TransportAllowance,
        "prorate_transport_allowance",
        "Prorated Transport Allowance",
        master.transport_allowance,
    );
    let other_allowance = prorate(
        SalaryField::OtherAllowance,
        "prorate_other_allowance",
        "Prorated Other Allowance",
        master.other_allowance,
    );
    let consolidated_pay = prorate(
        SalaryField::ConsolidatedPay,
        "prorate_consolidated_pay",
        "Prorated Consolidated Pay",
        master.consolidated_salary,
    );
    let plb = d.track(
        SalaryField::Plb,
        "performance_linked_bonus",
        "Performance Linked Bonus",
        master.plb,
        json!({ "plb": text(master.plb) }),
        "taken from salary master".to_string(),
    );

    // Gross
    let components = [
        basic,
        hra,
        cca,
        transport_allowance,
        other_allowance,
        consolidated_pay,
        plb,
    ];
    let gross_computed: Decimal = components.iter().map(|c| c.value).sum();
    let gross_pay = d.track(
        SalaryField::GrossPay,
        "gross_pay",
        "Gross Pay",
        gross_computed,
        json!({
            "components": components.iter().map(|c| text(c.value)).collect::<Vec<_>>(),
        }),
        "sum of prorated components and PLB".to_string(),
    );

    // Employee deductions
    let pf = &rates.provident_fund;
    let pf_wage = basic.value.min(pf.wage_ceiling);
    let employee_pf = d.track(
        SalaryField::EmployeePf,
        "employee_pf",
        "Employee Provident Fund",
        money(pf.employee_rate * pf_wage, rates),
        json!({ "pf_wage": text(pf_wage), "rate": text(pf.employee_rate) }),
        format!("{} * min({}, {})", text(pf.employee_rate), text(basic.value), text(pf.wage_ceiling)),
    );

    let esi = &rates.esi;
    let esi_eligible = gross_pay.value <= esi.gross_ceiling;
    let esi_amount = |rate: Decimal| {
        if esi_eligible {
            (rate * gross_pay.value).ceil()
        } else {
            Decimal::ZERO
        }
    };
    let employee_esi = d.track(
        SalaryField::EmployeeEsi,
        "employee_esi",
        "Employee State Insurance",
        esi_amount(esi.employee_rate),
        json!({
            "gross": text(gross_pay.value),
            "rate": text(esi.employee_rate),
            "gross_ceiling": text(esi.gross_ceiling),
        }),
        if esi_eligible {
            format!("ceil({} * {})", text(esi.employee_rate), text(gross_pay.value))
        } else {
            format!("gross above {}, not covered", text(esi.gross_ceiling))
        },
    );

    let pt_computed = rates.professional_tax_for(gross_pay.value);
    let professional_tax = d.track(
        SalaryField::ProfessionalTax,
        "professional_tax",
        "Professional Tax",
        pt_computed,
        json!({ "gross": text(gross_pay.value) }),
        format!("slab for gross {}", text(gross_pay.value)),
    );
    let tds = d.track(
        SalaryField::Tds,
        "tds",
        "Tax Deducted at Source",
        master.tds,
        json!({ "tds": text(master.tds) }),
        "taken from salary master".to_string(),
    );

    let deductions = [employee_pf, employee_esi, professional_tax, tds];
    let total_deductions = d.track(
        SalaryField::TotalDeductions,
        "total_deductions",
        "Total Deductions",
        deductions.iter().map(|a| a.value).sum(),
        json!({
            "employee_pf": text(employee_pf.value),
            "employee_esi": text(employee_esi.value),
            "professional_tax": text(professional_tax.value),
            "tds": text(tds.value),
        }),
        "pf + esi + professional tax + tds".to_string(),
    );
    let net_pay = d.track(
        SalaryField::NetPay,
        "net_pay",
        "Net Pay",
        gross_pay.value - total_deductions.value,
        json!({ "gross": text(gross_pay.value), "total_deductions": text(total_deductions.value) }),
        format!("{} - {}", text(gross_pay.value), text(total_deductions.value)),
    );

    // Employer costs
    let employer_pf = d.track(
        SalaryField::EmployerPf,
        "employer_pf",
        "Employer Provident Fund",
        money(pf.employer_rate * pf_wage, rates),
        json!({ "pf_wage": text(pf_wage), "rate": text(pf.employer_rate) }),
        format!("{} * min({}, {})", text(pf.employer_rate), text(basic.value), text(pf.wage_ceiling)),
    );
    let employer_esi = d.track(
        SalaryField::EmployerEsi,
        "employer_esi",
        "Employer State Insurance",
        esi_amount(esi.employer_rate),
        json!({
            "gross": text(gross_pay.value),
            "rate": text(esi.employer_rate),
            "gross_ceiling": text(esi.gross_ceiling),
        }),
        if esi_eligible {
            format!("ceil({} * {})", text(esi.employer_rate), text(gross_pay.value))
        } else {
            format!("gross above {}, not covered", text(esi.gross_ceiling))
        },
    );
    let bonus_wage = basic.value.min(rates.bonus.wage_ceiling);
    let bonus = d.track(
        SalaryField::Bonus,
        "statutory_bonus",
        "Statutory Bonus",
        money(rates.bonus.rate * bonus_wage, rates),
        json!({ "bonus_wage": text(bonus_wage), "rate": text(rates.bonus.rate) }),
        format!(
            "{} * min({}, {})",
            text(rates.bonus.rate),
            text(basic.value),
            text(rates.bonus.wage_ceiling)
        ),
    );
    let cost_to_company = d.track(
        SalaryField::CostToCompany,
        "cost_to_company",
        "Cost to Company",
        gross_pay.value + employer_pf.value + employer_esi.value + bonus.value,
        json!({
            "gross": text(gross_pay.value),
            "employer_pf": text(employer_pf.value),
            "employer_esi": text(employer_esi.value),
            "bonus": text(bonus.value),
        }),
        "gross + employer pf + employer esi + bonus".to_string(),
    );

    let overridden = d
        .steps
        .iter()
        .filter(|step| step.output["overridden"] == json!(true))
        .count();
    if overridden > 0 {
        info!(
            employee_id = %summary.employee_id,
            cycle = %summary.cycle,
            overridden,
            "Kept manually overridden salary fields"
        );
    }
    debug!(
        employee_id = %summary.employee_id,
        cycle = %summary.cycle,
        net_pay = %net_pay.value,
        "Derived salary"
    );

    let record = SalaryRecord {
        employee_id: summary.employee_id.clone(),
        cycle: summary.cycle,
        total_days: summary.total_days,
        days_worked: summary.days_worked,
        paid_leave_days: input.leave.paid_days,
        unpaid_leave_days: input.leave.unpaid_days,
        lop,
        days_paid,
        basic,
        hra,
        cca,
        transport_allowance,
        other_allowance,
        consolidated_pay,
        plb,
        gross_pay,
        employee_pf,
        employee_esi,
        professional_tax,
        tds,
        total_deductions,
        net_pay,
        employer_pf,
        employer_esi,
        bonus,
        cost_to_company,
        generated_at,
    };

    Ok(SalaryDerivation {
        record,
        audit_steps: d.steps,
    })
}
