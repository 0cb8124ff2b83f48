//! Performance benchmarks for the Attendance Engine.
//!
//! This benchmark suite covers the hot paths of a payroll run:
//! - Single day evaluation
//! - Export grid parsing for growing employee counts
//! - Salary derivation for one employee
//! - Full export ingestion through the batch service
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use chrono::{NaiveDate, NaiveTime, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use attendance_engine::calculation::{
    CycleCounters, DayInput, SalaryInput, derive_salary, evaluate_day, parse_grid,
};
use attendance_engine::config::{AttendancePolicy, ConfigLoader, StatutoryRates};
use attendance_engine::models::{
    Cell, Grid, LeaveClassification, MonthlySummary, PayrollCycle, SalaryMaster,
};
use attendance_engine::service::{self, EngineState, IngestRequest};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid bench date")
}

/// Builds an export with `employees` blocks covering a whole payroll cycle.
fn create_export(employees: usize) -> Grid {
    let cycle = PayrollCycle::new(2025, 1).expect("valid cycle");
    let labels: Vec<String> = cycle.dates().map(|d| d.format("%-d-%b").to_string()).collect();

    let mut grid = Vec::new();
    for i in 0..employees {
        grid.push(vec![
            Cell::from("Employee Code:"),
            Cell::from(format!("E{i:04}").as_str()),
        ]);

        let mut header = vec![Cell::from("Days")];
        let mut ins = vec![Cell::from("In Time")];
        let mut outs = vec![Cell::from("Out Time")];
        for (day, label) in labels.iter().enumerate() {
            header.push(Cell::from(label.as_str()));
            ins.push(Cell::from(if day % 4 == 0 { "09:22" } else { "09:05" }));
            outs.push(Cell::Number(0.74));
        }
        grid.extend([header, ins, outs]);
    }
    grid
}

/// Benchmark: Single day evaluation.
fn bench_evaluate_day(c: &mut Criterion) {
    let policy = AttendancePolicy::default();
    let input = DayInput {
        time_in: NaiveTime::from_hms_opt(9, 20, 0),
        time_out: NaiveTime::from_hms_opt(16, 0, 0),
        is_weekly_off: false,
        is_holiday: false,
    };
    let counters = CycleCounters {
        late_used: 2,
        permission_used: 1,
    };

    c.bench_function("evaluate_day", |b| {
        b.iter(|| black_box(evaluate_day(black_box(&input), counters, &policy)))
    });
}

/// Benchmark: Grid parsing for growing exports.
fn bench_parse_grid(c: &mut Criterion) {
    let from = date("2024-12-21");
    let to = date("2025-01-20");
    let mut group = c.benchmark_group("parse_grid");

    for employees in [1usize, 10, 100].iter() {
        let grid = create_export(*employees);
        group.throughput(Throughput::Elements(*employees as u64));
        group.bench_with_input(BenchmarkId::new("employees", employees), &grid, |b, grid| {
            b.iter(|| black_box(parse_grid(grid, from, to)))
        });
    }

    group.finish();
}

/// Benchmark: Salary derivation for one employee.
fn bench_derive_salary(c: &mut Criterion) {
    let cycle = PayrollCycle::new(2025, 1).expect("valid cycle");
    let summary = MonthlySummary {
        employee_id: "E0001".to_string(),
        cycle,
        total_present: Decimal::from(22),
        total_absent: Decimal::from(4),
        total_leave_taken: Decimal::from(2),
        total_weekly_off: Decimal::from(4),
        total_holiday: Decimal::ONE,
        worked_weekly_off: Decimal::ZERO,
        missing_days: 0,
        total_days: cycle.total_days(),
        days_worked: Decimal::from(27),
        computed_at: Utc::now(),
    };
    let master = SalaryMaster {
        employee_id: "E0001".to_string(),
        effective_from: date("2024-04-01"),
        basic: Decimal::from(12400),
        hra: Decimal::from(6200),
        cca: Decimal::ZERO,
        transport_allowance: Decimal::from(1550),
        other_allowance: Decimal::ZERO,
        plb: Decimal::from(500),
        tds: Decimal::ZERO,
        consolidated_salary: Decimal::ZERO,
    };
    let input = SalaryInput {
        summary: &summary,
        leave: LeaveClassification {
            paid_days: Decimal::from(2),
            unpaid_days: Decimal::ZERO,
        },
        master: &master,
    };
    let rates = StatutoryRates::default();

    c.bench_function("derive_salary", |b| {
        b.iter(|| black_box(derive_salary(black_box(&input), None, &rates, Utc::now())))
    });
}

/// Benchmark: Ingesting a 100-employee export through the batch service.
fn bench_ingest_export(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    let state = EngineState::new(config);
    let grid = create_export(100);

    let mut group = c.benchmark_group("batch_processing");
    group.throughput(Throughput::Elements(100));
    group.sample_size(10);

    group.bench_function("ingest_100_employees", |b| {
        b.to_async(&rt).iter(|| async {
            let request = IngestRequest {
                grid: grid.clone(),
                from: date("2024-12-21"),
                to: date("2025-01-20"),
            };
            black_box(service::ingest_export(&state, request).await)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_evaluate_day,
    bench_parse_grid,
    bench_derive_salary,
    bench_ingest_export,
);
criterion_main!(benches);
