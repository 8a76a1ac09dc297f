//! Full-pipeline example: a household overspending its dining budget.
//!
//! ```bash
//! cargo run --example budget_alerts
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use forecash::core::account::{
    Account, AccountId, AccountType, Category, CurrencyCode, RegionCode,
};
use forecash::core::period::Granularity;
use forecash::core::transaction::{Transaction, TransactionLog};
use forecash::pipeline::run::{AccountContext, ForecastStore, Pipeline, PipelineConfig};
use forecash::pipeline::scheduler::CancelToken;
use forecash::risk::budget::Budget;
use forecash::rules::ruleset::{RuleSet, RuleSetRegistry, TaxBracket};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let account = Account::new(
        AccountId::new("ACC-001"),
        "demo-user",
        RegionCode::new("DE"),
        AccountType::Checking,
        CurrencyCode::new("EUR"),
    );

    // Dining spend creeping upward month over month.
    let dining: Vec<i64> = vec![-18_000, -19_500, -21_000, -22_800, -24_500, -26_000];
    let log: TransactionLog = dining
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            Transaction::new(
                account.account_id.clone(),
                Utc.with_ymd_and_hms(2025, i as u32 + 1, 20, 19, 30, 0).unwrap(),
                amount,
                Category::new("dining"),
                CurrencyCode::new("EUR"),
            )
        })
        .collect();

    let mut registry = RuleSetRegistry::new();
    registry.publish(RuleSet {
        region_code: RegionCode::new("DE"),
        version: "2025".to_string(),
        effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        effective_to: None,
        brackets: vec![TaxBracket {
            floor_minor: 0,
            ceiling_minor: None,
            marginal_rate: dec!(0),
        }],
        loans: Vec::new(),
    })?;

    let budgets = vec![Budget::for_category(
        account.account_id.clone(),
        Category::new("dining"),
        -25_000,
        Granularity::Monthly,
    )];

    let ctx = AccountContext {
        account: &account,
        log: &log,
        budgets: &budgets,
        opening_balance_minor: 300_000,
    };

    let mut store = ForecastStore::new();
    Pipeline::run_account(
        &mut store,
        &registry,
        &ctx,
        &PipelineConfig::default(),
        Utc.with_ymd_and_hms(2025, 6, 25, 8, 0, 0).unwrap(),
        &CancelToken::new(),
    )?;

    let run = store
        .latest(&account.account_id)
        .expect("run was just published");

    println!("Published run v{} ({})", run.version, run.run_id);
    for alert in &run.alerts {
        println!(
            "{:?}: dining projected below {} in {} ({} period(s) ahead)",
            alert.severity,
            alert.threshold_minor,
            alert.projected_breach_period,
            alert.lead_time_periods
        );
    }
    for insight in &run.insights {
        println!(
            "{:?} → {:?} (magnitude {})",
            insight.summary_kind, insight.recommended_action_kind, insight.magnitude_minor
        );
    }
    Ok(())
}
