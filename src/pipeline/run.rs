use crate::core::account::{Account, AccountId};
use crate::core::period::Granularity;
use crate::core::transaction::TransactionLog;
use crate::error::EngineError;
use crate::forecast::engine::{ForecastConfig, ForecastSeries, Forecaster};
use crate::insight::{compose, Insight};
use crate::pipeline::scheduler::{AccountLease, CancelToken};
use crate::risk::alert::{Alert, AlertBook};
use crate::risk::budget::Budget;
use crate::risk::engine::{RiskConfig, RiskEngine};
use crate::rules::evaluate::{evaluate, NetForecast};
use crate::rules::ruleset::RuleSetRegistry;
use crate::series::aggregate::aggregate;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Configuration for one account's forecasting pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub granularity: Granularity,
    pub forecast: ForecastConfig,
    pub risk: RiskConfig,
    /// Earliest date transactions are aggregated from.
    pub history_window_start: NaiveDate,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            forecast: ForecastConfig::default(),
            risk: RiskConfig::default(),
            history_window_start: NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Everything the pipeline reads for one account. All references:
/// the engine mutates none of its inputs.
#[derive(Debug)]
pub struct AccountContext<'a> {
    pub account: &'a Account,
    pub log: &'a TransactionLog,
    pub budgets: &'a [Budget],
    pub opening_balance_minor: i64,
}

/// One completed, published forecasting run. Immutable once stored;
/// later runs supersede it by version, never edit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRun {
    pub run_id: Uuid,
    /// Per-account monotonically increasing version.
    pub version: u64,
    pub account_id: AccountId,
    pub as_of: NaiveDate,
    pub completed_at: DateTime<Utc>,
    pub forecasts: Vec<ForecastSeries>,
    pub net_forecasts: Vec<NetForecast>,
    pub alerts: Vec<Alert>,
    pub insights: Vec<Insight>,
}

/// Versioned, append-only arena of published runs plus the alert
/// book.
///
/// A failed or cancelled run never reaches `publish`, so the previous
/// run stays visible — stale-but-available rather than absent.
#[derive(Debug, Default)]
pub struct ForecastStore {
    runs: HashMap<AccountId, Vec<ForecastRun>>,
    alert_book: AlertBook,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Version the next run for this account will get.
    pub fn next_version(&self, account: &AccountId) -> u64 {
        self.latest_version(account) + 1
    }

    /// Latest published version, 0 when none exists.
    pub fn latest_version(&self, account: &AccountId) -> u64 {
        self.runs
            .get(account)
            .and_then(|runs| runs.last())
            .map(|run| run.version)
            .unwrap_or(0)
    }

    /// The most recent successfully published run.
    pub fn latest(&self, account: &AccountId) -> Option<&ForecastRun> {
        self.runs.get(account).and_then(|runs| runs.last())
    }

    /// Every published run for an account, oldest first.
    pub fn history(&self, account: &AccountId) -> &[ForecastRun] {
        self.runs.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Atomically publish a completed run and its alerts.
    pub fn publish(&mut self, run: ForecastRun) {
        self.alert_book.publish(&run.account_id, run.alerts.clone());
        info!(
            "published run {} v{} for {}: {} forecast(s), {} alert(s)",
            run.run_id,
            run.version,
            run.account_id,
            run.forecasts.len(),
            run.alerts.len()
        );
        self.runs.entry(run.account_id.clone()).or_default().push(run);
    }

    /// Current (non-stale) alerts for an account.
    pub fn active_alerts(&self, account: &AccountId) -> Vec<&Alert> {
        self.alert_book.active(account)
    }

    /// Full alert audit trail, stale and resolved included.
    pub fn audit_alerts(&self, account: &AccountId) -> Vec<&Alert> {
        self.alert_book.all_for_audit(account)
    }

    pub fn alert_book_mut(&mut self) -> &mut AlertBook {
        &mut self.alert_book
    }
}

/// The per-account forecasting pipeline.
///
/// Stages run sequentially (aggregate, forecast, apply rules, assess
/// risk, compose insights), building the whole run in memory and
/// publishing it in one step at the end. Cancellation or any stage
/// error leaves the store untouched.
pub struct Pipeline;

impl Pipeline {
    /// Run the full pipeline for one account and publish the result.
    ///
    /// Returns the published version. Categories with too little
    /// history are skipped; the run fails only when no category can
    /// be forecast at all, or when rule selection, aggregation, or
    /// cancellation stops it.
    pub fn run_account(
        store: &mut ForecastStore,
        registry: &RuleSetRegistry,
        ctx: &AccountContext<'_>,
        config: &PipelineConfig,
        now: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<u64, EngineError> {
        let run = Self::compute_run(store, registry, ctx, config, now, cancel)?;
        let version = run.version;
        store.publish(run);
        Ok(version)
    }

    /// Serialized variant: holds the account's lease for the duration
    /// of the run, and coalesces with an overlapping run. If another
    /// run published while this caller waited for the lease, its
    /// version is returned instead of recomputing.
    pub fn run_account_serialized(
        store: &Mutex<ForecastStore>,
        lease: &AccountLease,
        registry: &RuleSetRegistry,
        ctx: &AccountContext<'_>,
        config: &PipelineConfig,
        now: DateTime<Utc>,
        cancel: &CancelToken,
        lease_timeout: std::time::Duration,
    ) -> Result<u64, EngineError> {
        let account_id = &ctx.account.account_id;
        let version_before = {
            let store = store.lock().unwrap_or_else(|e| e.into_inner());
            store.latest_version(account_id)
        };

        let _guard = lease
            .acquire(account_id, lease_timeout)
            .ok_or_else(|| EngineError::Cancelled {
                account: account_id.clone(),
            })?;

        {
            let store = store.lock().unwrap_or_else(|e| e.into_inner());
            let current = store.latest_version(account_id);
            if current > version_before {
                // An overlapping run finished while we waited; its
                // result answers this request.
                return Ok(current);
            }
        }

        // Compute outside the store lock so other accounts' runs
        // proceed in parallel; lock only to publish.
        let run = {
            let store_read = store.lock().unwrap_or_else(|e| e.into_inner());
            let version = store_read.next_version(account_id);
            drop(store_read);
            Self::compute_run_versioned(registry, ctx, config, now, cancel, version)?
        };

        let version = run.version;
        let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
        store.publish(run);
        Ok(version)
    }

    /// Nightly batch entry point: run every account, isolating
    /// failures — one account's error never aborts the others.
    pub fn run_all(
        store: &mut ForecastStore,
        registry: &RuleSetRegistry,
        contexts: &[AccountContext<'_>],
        config: &PipelineConfig,
        now: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Vec<(AccountId, Result<u64, EngineError>)> {
        contexts
            .iter()
            .map(|ctx| {
                let account_id = ctx.account.account_id.clone();
                let result = Self::run_account(store, registry, ctx, config, now, cancel);
                if let Err(err) = &result {
                    warn!("run failed for {}: {} (prior forecast retained)", account_id, err);
                }
                (account_id, result)
            })
            .collect()
    }

    fn compute_run(
        store: &ForecastStore,
        registry: &RuleSetRegistry,
        ctx: &AccountContext<'_>,
        config: &PipelineConfig,
        now: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<ForecastRun, EngineError> {
        let version = store.next_version(&ctx.account.account_id);
        Self::compute_run_versioned(registry, ctx, config, now, cancel, version)
    }

    fn compute_run_versioned(
        registry: &RuleSetRegistry,
        ctx: &AccountContext<'_>,
        config: &PipelineConfig,
        now: DateTime<Utc>,
        cancel: &CancelToken,
        version: u64,
    ) -> Result<ForecastRun, EngineError> {
        let account_id = &ctx.account.account_id;
        let as_of = now.date_naive();
        let now_period = config.granularity.floor(as_of);
        let range_end = as_of + Duration::days(1);

        cancel.check(account_id)?;

        // Rule selection first: a configuration gap fails the run
        // before any model work happens.
        let rules = registry.select(&ctx.account.region_code, as_of)?;

        let mut forecasts = Vec::new();
        let mut net_forecasts = Vec::new();
        let mut last_skip: Option<EngineError> = None;

        for category in ctx.log.categories() {
            cancel.check(account_id)?;

            let series = aggregate(
                ctx.log,
                account_id,
                &category,
                config.granularity,
                config.history_window_start,
                range_end,
            )?;

            match Forecaster::forecast(&series, &config.forecast) {
                Ok(gross) => {
                    let net = evaluate(&gross, rules);
                    forecasts.push(gross);
                    net_forecasts.push(net);
                }
                Err(err @ EngineError::InsufficientHistory { .. }) => {
                    warn!("skipping {}/{}: {}", account_id, category, err);
                    last_skip = Some(err);
                }
                Err(other) => return Err(other),
            }
        }

        if forecasts.is_empty() {
            // Nothing forecastable: surface why instead of publishing
            // an empty run over the previous good one.
            return Err(last_skip.unwrap_or(EngineError::InsufficientHistory {
                account: account_id.clone(),
                category: "<none>".to_string(),
                observed: 0,
                required: config.forecast.min_history,
            }));
        }

        cancel.check(account_id)?;

        let version_tag = format!("run-{}", version);
        let alerts = RiskEngine::evaluate(
            account_id,
            &net_forecasts,
            ctx.budgets,
            ctx.opening_balance_minor,
            now_period,
            &version_tag,
            &config.risk,
        );
        let insights = compose(&alerts, &net_forecasts, ctx.opening_balance_minor);

        cancel.check(account_id)?;

        Ok(ForecastRun {
            run_id: Uuid::new_v4(),
            version,
            account_id: account_id.clone(),
            as_of,
            completed_at: now,
            forecasts,
            net_forecasts,
            alerts,
            insights,
        })
    }
}
