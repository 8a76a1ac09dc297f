use criterion::{black_box, criterion_group, criterion_main, Criterion};
use forecash::core::account::{AccountId, Category};
use forecash::core::period::Granularity;
use forecash::forecast::engine::{ForecastConfig, Forecaster};
use forecash::series::aggregate::aggregate;
use forecash::simulation::generator::{generate_history, GeneratorConfig};
use chrono::NaiveDate;

fn bench_aggregate_2_years(c: &mut Criterion) {
    let log = generate_history(&GeneratorConfig {
        months: 24,
        ..Default::default()
    });

    c.bench_function("aggregate_2_years", |b| {
        b.iter(|| {
            aggregate(
                black_box(&log),
                &AccountId::new("ACC-SIM"),
                &Category::new("groceries"),
                Granularity::Monthly,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            )
        })
    });
}

fn bench_aggregate_10_years(c: &mut Criterion) {
    let log = generate_history(&GeneratorConfig {
        months: 120,
        ..Default::default()
    });

    c.bench_function("aggregate_10_years", |b| {
        b.iter(|| {
            aggregate(
                black_box(&log),
                &AccountId::new("ACC-SIM"),
                &Category::new("groceries"),
                Granularity::Monthly,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2034, 1, 1).unwrap(),
            )
        })
    });
}

fn bench_forecast_2_years(c: &mut Criterion) {
    let log = generate_history(&GeneratorConfig {
        months: 24,
        ..Default::default()
    });
    let series = aggregate(
        &log,
        &AccountId::new("ACC-SIM"),
        &Category::new("groceries"),
        Granularity::Monthly,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
    )
    .unwrap();

    c.bench_function("forecast_2_years", |b| {
        b.iter(|| Forecaster::forecast(black_box(&series), &ForecastConfig::default()))
    });
}

fn bench_forecast_10_years(c: &mut Criterion) {
    let log = generate_history(&GeneratorConfig {
        months: 120,
        ..Default::default()
    });
    let series = aggregate(
        &log,
        &AccountId::new("ACC-SIM"),
        &Category::new("groceries"),
        Granularity::Monthly,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2034, 1, 1).unwrap(),
    )
    .unwrap();

    c.bench_function("forecast_10_years", |b| {
        b.iter(|| Forecaster::forecast(black_box(&series), &ForecastConfig::default()))
    });
}

criterion_group!(
    benches,
    bench_aggregate_2_years,
    bench_aggregate_10_years,
    bench_forecast_2_years,
    bench_forecast_10_years
);
criterion_main!(benches);
