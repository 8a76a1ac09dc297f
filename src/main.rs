//! forecash CLI
//!
//! Run the cash-flow forecasting pipeline from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Forecast an account from a JSON snapshot
//! forecash run --input account.json --rules rules.json
//!
//! # Output as JSON
//! forecash run --input account.json --rules rules.json --format json
//!
//! # Generate a synthetic history for testing
//! forecash generate --months 24 --seed 42
//! ```

use chrono::{NaiveDate, Utc};
use forecash::core::account::{Account, AccountId, AccountType, Category, CurrencyCode, RegionCode};
use forecash::core::period::Granularity;
use forecash::core::transaction::{Transaction, TransactionLog};
use forecash::pipeline::run::{AccountContext, ForecastStore, Pipeline, PipelineConfig};
use forecash::pipeline::scheduler::CancelToken;
use forecash::risk::budget::Budget;
use forecash::rules::ruleset::{RuleSet, RuleSetRegistry};
use forecash::simulation::generator::{generate_history, GeneratorConfig};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"forecash — cash flow forecasting and proactive overspend risk

USAGE:
    forecash <COMMAND> [OPTIONS]

COMMANDS:
    run         Run the full pipeline for one account snapshot
    generate    Generate a synthetic transaction history (for testing)
    help        Show this message

OPTIONS (run):
    --input <FILE>        Path to JSON account snapshot
    --rules <FILE>        Path to JSON rule set file
    --granularity <G>     daily, weekly or monthly (default: monthly)
    --as-of <DATE>        Forecast as of this date (default: today, YYYY-MM-DD)
    --format <FORMAT>     Output format: text (default) or json

OPTIONS (generate):
    --months <N>          Months of history (default: 24)
    --seed <N>            RNG seed (default: 42)
    --output <FILE>       Write to file instead of stdout

EXAMPLES:
    forecash run --input account.json --rules rules.json
    forecash run --input account.json --rules rules.json --format json --as-of 2025-06-20
    forecash generate --months 36 --seed 7 --output account.json"#
    );
}

/// JSON schema for the account snapshot.
#[derive(serde::Serialize, serde::Deserialize)]
struct SnapshotFile {
    account: AccountInput,
    #[serde(default)]
    opening_balance_minor: i64,
    transactions: Vec<TransactionInput>,
    #[serde(default)]
    budgets: Vec<BudgetInput>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct AccountInput {
    account_id: String,
    #[serde(default = "default_owner")]
    owner_id: String,
    region_code: String,
    #[serde(default = "default_account_type")]
    account_type: AccountType,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_owner() -> String {
    "unknown".to_string()
}

fn default_account_type() -> AccountType {
    AccountType::Checking
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[derive(serde::Serialize, serde::Deserialize)]
struct TransactionInput {
    timestamp: chrono::DateTime<Utc>,
    amount_minor: i64,
    category: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct BudgetInput {
    /// Absent = total-balance floor.
    #[serde(default)]
    category: Option<String>,
    threshold_minor: i64,
}

#[derive(serde::Deserialize)]
struct RulesFile {
    rule_sets: Vec<RuleSet>,
}

fn load_snapshot(path: &str) -> SnapshotFile {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "account": {{ "account_id": "ACC-001", "region_code": "DE" }},
  "opening_balance_minor": 250000,
  "transactions": [
    {{ "timestamp": "2025-01-15T12:00:00Z", "amount_minor": -4500, "category": "groceries" }}
  ],
  "budgets": [
    {{ "category": "groceries", "threshold_minor": -50000 }}
  ]
}}"#
        );
        process::exit(1);
    })
}

fn load_rules(path: &str) -> RuleSetRegistry {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    let file: RulesFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing rules JSON: {}", e);
        process::exit(1);
    });

    let mut registry = RuleSetRegistry::new();
    for rule_set in file.rule_sets {
        registry.publish(rule_set).unwrap_or_else(|e| {
            eprintln!("Invalid rule set: {}", e);
            process::exit(1);
        });
    }
    registry
}

fn cmd_run(args: &[String]) {
    let mut input_path = None;
    let mut rules_path = None;
    let mut granularity = Granularity::Monthly;
    let mut as_of: Option<NaiveDate> = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--rules" => {
                i += 1;
                rules_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--rules requires a file path");
                    process::exit(1);
                }));
            }
            "--granularity" => {
                i += 1;
                granularity = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--granularity requires 'daily', 'weekly' or 'monthly'");
                        process::exit(1);
                    });
            }
            "--as-of" => {
                i += 1;
                as_of = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--as-of requires a date (YYYY-MM-DD)");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });
    let rules_path = rules_path.unwrap_or_else(|| {
        eprintln!("Error: --rules <FILE> is required");
        process::exit(1);
    });

    let snapshot = load_snapshot(&input_path);
    let registry = load_rules(&rules_path);

    let account = Account::new(
        AccountId::new(&snapshot.account.account_id),
        snapshot.account.owner_id.clone(),
        RegionCode::new(&snapshot.account.region_code),
        snapshot.account.account_type,
        CurrencyCode::new(&snapshot.account.currency),
    );

    let log: TransactionLog = snapshot
        .transactions
        .iter()
        .map(|t| {
            Transaction::new(
                account.account_id.clone(),
                t.timestamp,
                t.amount_minor,
                Category::new(&t.category),
                account.currency.clone(),
            )
        })
        .collect();

    let budgets: Vec<Budget> = snapshot
        .budgets
        .iter()
        .map(|b| match &b.category {
            Some(category) => Budget::for_category(
                account.account_id.clone(),
                Category::new(category),
                b.threshold_minor,
                granularity,
            ),
            None => Budget::for_total(account.account_id.clone(), b.threshold_minor, granularity),
        })
        .collect();

    let now = match as_of {
        Some(date) => match date.and_hms_opt(0, 0, 0) {
            Some(dt) => dt.and_utc(),
            None => Utc::now(),
        },
        None => Utc::now(),
    };

    let config = PipelineConfig {
        granularity,
        ..PipelineConfig::default()
    };
    let ctx = AccountContext {
        account: &account,
        log: &log,
        budgets: &budgets,
        opening_balance_minor: snapshot.opening_balance_minor,
    };

    let mut store = ForecastStore::new();
    let cancel = CancelToken::new();
    if let Err(e) = Pipeline::run_account(&mut store, &registry, &ctx, &config, now, &cancel) {
        eprintln!("Forecast run failed: {}", e);
        process::exit(1);
    }

    let run = match store.latest(&account.account_id) {
        Some(run) => run,
        None => {
            eprintln!("No run was published");
            process::exit(1);
        }
    };

    if format == "json" {
        match serde_json::to_string_pretty(run) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing run: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!(
            "Run {} (v{}) for {} as of {}",
            run.run_id, run.version, run.account_id, run.as_of
        );
        for net in &run.net_forecasts {
            println!(
                "\n{} ({}, rules {}):",
                net.category, net.granularity, net.applied_rule_version
            );
            for p in &net.periods {
                println!(
                    "  {}  net {:>12}  [{} .. {}]",
                    p.period_start, p.net_point, p.net_lower, p.net_upper
                );
            }
        }
        if run.alerts.is_empty() {
            println!("\nNo projected budget breaches.");
        } else {
            println!("\nAlerts:");
            for alert in &run.alerts {
                println!(
                    "  {:?} {} breach of {} projected for {} ({} period(s) ahead)",
                    alert.severity,
                    alert
                        .category
                        .as_ref()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "total balance".to_string()),
                    alert.threshold_minor,
                    alert.projected_breach_period,
                    alert.lead_time_periods
                );
            }
        }
        if !run.insights.is_empty() {
            println!("\nInsights:");
            for insight in &run.insights {
                println!(
                    "  {:?}{} magnitude {} → {:?}",
                    insight.summary_kind,
                    insight
                        .affected_category
                        .as_ref()
                        .map(|c| format!(" ({})", c))
                        .unwrap_or_default(),
                    insight.magnitude_minor,
                    insight.recommended_action_kind
                );
            }
        }
    }
}

fn cmd_generate(args: &[String]) {
    let mut months = 24u32;
    let mut seed = 42u64;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--months" => {
                i += 1;
                months = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--months requires a number");
                    process::exit(1);
                });
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a number");
                    process::exit(1);
                });
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = GeneratorConfig {
        months,
        seed,
        ..Default::default()
    };
    let log = generate_history(&config);

    let snapshot = SnapshotFile {
        account: AccountInput {
            account_id: config.account_id.to_string(),
            owner_id: "sim-user".to_string(),
            region_code: "DE".to_string(),
            account_type: AccountType::Checking,
            currency: config.currency.to_string(),
        },
        opening_balance_minor: 250_000,
        transactions: log
            .transactions()
            .iter()
            .map(|t| TransactionInput {
                timestamp: t.timestamp(),
                amount_minor: t.amount_minor(),
                category: t.category().to_string(),
            })
            .collect(),
        budgets: vec![BudgetInput {
            category: Some("groceries".to_string()),
            threshold_minor: -60_000,
        }],
    };

    let json = match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing snapshot: {}", e);
            process::exit(1);
        }
    };

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} transactions over {} months → {}",
            log.len(),
            months,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
