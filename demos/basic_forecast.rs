//! Minimal example: aggregate a year of grocery spending and forecast
//! six months ahead.
//!
//! ```bash
//! cargo run --example basic_forecast
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use forecash::core::account::{AccountId, Category, CurrencyCode};
use forecash::core::period::Granularity;
use forecash::core::transaction::{Transaction, TransactionLog};
use forecash::forecast::engine::{ForecastConfig, Forecaster};
use forecash::series::aggregate::aggregate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let account = AccountId::new("ACC-001");
    let groceries = Category::new("groceries");

    let amounts = [
        -42_300, -45_100, -39_800, -44_600, -47_200, -41_900, -43_500, -46_800, -40_200, -45_900,
        -48_100, -44_000,
    ];
    let log: TransactionLog = amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            Transaction::new(
                account.clone(),
                Utc.with_ymd_and_hms(2024, i as u32 + 1, 15, 12, 0, 0).unwrap(),
                amount,
                groceries.clone(),
                CurrencyCode::new("EUR"),
            )
        })
        .collect();

    let series = aggregate(
        &log,
        &account,
        &groceries,
        Granularity::Monthly,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    )?;

    let forecast = Forecaster::forecast(&series, &ForecastConfig::default())?;

    println!("Model: {}", forecast.model_version);
    for point in forecast.points() {
        println!(
            "{}  {:>10}  [{} .. {}]",
            point.period_start, point.point_estimate, point.lower_bound, point.upper_bound
        );
    }
    Ok(())
}
