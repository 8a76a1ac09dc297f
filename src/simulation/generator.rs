//! Synthetic household generator.
//!
//! Produces plausible transaction histories for exercising the
//! pipeline: recurring salary, category spending with drift and noise,
//! and occasional one-time spikes.

use crate::core::account::{AccountId, Category, CurrencyCode};
use crate::core::transaction::{Transaction, TransactionLog};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Average monthly outflow profile for one spending category.
#[derive(Debug, Clone)]
pub struct CategoryProfile {
    pub category: Category,
    /// Mean monthly spend, minor units. Positive; emitted as outflows.
    pub mean_monthly_minor: i64,
    /// Per-month multiplicative drift (0.01 = spend grows 1%/month).
    pub monthly_drift: f64,
    /// Relative noise around the mean (0.1 = ±10%).
    pub noise: f64,
}

/// Configuration for generating a synthetic transaction history.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub account_id: AccountId,
    pub currency: CurrencyCode,
    /// First month of history, from its first day.
    pub start: NaiveDate,
    /// Number of whole months to generate.
    pub months: u32,
    /// Monthly salary inflow, minor units. Zero disables it.
    pub salary_minor: i64,
    pub categories: Vec<CategoryProfile>,
    /// Probability per month of a one-time spike in a random category.
    pub spike_probability: f64,
    /// Spike size as a multiple of the category's monthly mean.
    pub spike_multiplier: f64,
    /// RNG seed; same seed, same history.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            account_id: AccountId::new("ACC-SIM"),
            currency: CurrencyCode::new("EUR"),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            months: 24,
            salary_minor: 320_000,
            categories: vec![
                CategoryProfile {
                    category: Category::new("rent"),
                    mean_monthly_minor: 120_000,
                    monthly_drift: 0.0,
                    noise: 0.0,
                },
                CategoryProfile {
                    category: Category::new("groceries"),
                    mean_monthly_minor: 45_000,
                    monthly_drift: 0.003,
                    noise: 0.12,
                },
                CategoryProfile {
                    category: Category::new("dining"),
                    mean_monthly_minor: 20_000,
                    monthly_drift: 0.0,
                    noise: 0.35,
                },
            ],
            spike_probability: 0.08,
            spike_multiplier: 2.5,
            seed: 42,
        }
    }
}

/// Generate a deterministic synthetic transaction history.
///
/// Each month gets one salary inflow on the 1st, one net outflow per
/// category around its (drifted, noised) mean, and possibly a spike.
pub fn generate_history(config: &GeneratorConfig) -> TransactionLog {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut log = TransactionLog::new();

    for month in 0..config.months {
        let period = add_months(config.start, month);

        if config.salary_minor > 0 {
            log.append(Transaction::new(
                config.account_id.clone(),
                at_noon(period, 1),
                config.salary_minor,
                Category::new("salary"),
                config.currency.clone(),
            ));
        }

        for profile in &config.categories {
            let drifted = profile.mean_monthly_minor as f64
                * (1.0 + profile.monthly_drift).powi(month as i32);
            let noised = if profile.noise > 0.0 {
                drifted * (1.0 + rng.gen_range(-profile.noise..profile.noise))
            } else {
                drifted
            };
            let day = rng.gen_range(2..28);
            log.append(Transaction::new(
                config.account_id.clone(),
                at_noon(period, day),
                -(noised.round() as i64),
                profile.category.clone(),
                config.currency.clone(),
            ));

            if rng.gen_bool(config.spike_probability.clamp(0.0, 1.0)) {
                let spike = (drifted * config.spike_multiplier).round() as i64;
                let day = rng.gen_range(2..28);
                log.append(Transaction::new(
                    config.account_id.clone(),
                    at_noon(period, day),
                    -spike,
                    profile.category.clone(),
                    config.currency.clone(),
                ));
            }
        }
    }

    log
}

fn add_months(start: NaiveDate, months: u32) -> NaiveDate {
    let total = start.year() as i64 * 12 + start.month0() as i64 + months as i64;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12);
    NaiveDate::from_ymd_opt(year as i32, month0 as u32 + 1, 1).unwrap_or(start)
}

fn at_noon(period: NaiveDate, day: u32) -> chrono::DateTime<Utc> {
    let date = period.with_day(day).unwrap_or(period);
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap_or(NaiveDateTime::MIN))
}
