use crate::core::account::AccountId;
use crate::risk::alert::{Alert, AlertStatus, Severity};
use crate::risk::budget::{Budget, BudgetScope};
use crate::rules::evaluate::NetForecast;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Tuning knobs for risk evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Lead time (in periods) beyond which a possible-only breach is
    /// reported as informational rather than a warning. Distant and
    /// uncertain is advice, not an alarm.
    pub far_horizon: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self { far_horizon: 3 }
    }
}

/// Compares net forecasts against budgets and emits typed alerts.
pub struct RiskEngine;

impl RiskEngine {
    /// Evaluate one account's net forecasts against its active
    /// budgets.
    ///
    /// Per breached period the threshold is split three ways against
    /// the uncertainty band: confidently clear (no alert), possible
    /// (warning, or info when far out), likely even in the optimistic
    /// case (critical). Periods before `now_period` are skipped, so
    /// lead times are never negative; a breach in the current period
    /// alerts at lead 0.
    pub fn evaluate(
        account_id: &AccountId,
        net_forecasts: &[NetForecast],
        budgets: &[Budget],
        opening_balance_minor: i64,
        now_period: NaiveDate,
        forecast_version: &str,
        config: &RiskConfig,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for budget in budgets.iter().filter(|b| &b.account_id == account_id) {
            match &budget.scope {
                BudgetScope::Category(category) => {
                    for net in net_forecasts
                        .iter()
                        .filter(|n| &n.category == category && n.granularity == budget.granularity)
                    {
                        for p in &net.periods {
                            let lead = budget.granularity.periods_between(now_period, p.period_start);
                            if lead < 0 {
                                continue;
                            }
                            if let Some(severity) = band_split(
                                Decimal::from(budget.threshold_minor),
                                p.net_lower,
                                p.net_upper,
                                lead as u32,
                                config,
                            ) {
                                alerts.push(Alert {
                                    alert_id: Uuid::new_v4(),
                                    account_id: account_id.clone(),
                                    category: Some(category.clone()),
                                    severity,
                                    projected_breach_period: p.period_start,
                                    lead_time_periods: lead as u32,
                                    threshold_minor: budget.threshold_minor,
                                    generating_forecast_version: forecast_version.to_string(),
                                    status: AlertStatus::Pending,
                                    superseded_by: None,
                                });
                            }
                        }
                    }
                }
                BudgetScope::Total => {
                    for (period_start, balance) in
                        cumulative_balance(net_forecasts, opening_balance_minor)
                    {
                        let lead = budget.granularity.periods_between(now_period, period_start);
                        if lead < 0 {
                            continue;
                        }
                        if let Some(severity) = band_split(
                            Decimal::from(budget.threshold_minor),
                            balance.lower,
                            balance.upper,
                            lead as u32,
                            config,
                        ) {
                            alerts.push(Alert {
                                alert_id: Uuid::new_v4(),
                                account_id: account_id.clone(),
                                category: None,
                                severity,
                                projected_breach_period: period_start,
                                lead_time_periods: lead as u32,
                                threshold_minor: budget.threshold_minor,
                                generating_forecast_version: forecast_version.to_string(),
                                status: AlertStatus::Pending,
                                superseded_by: None,
                            });
                        }
                    }
                }
            }
        }

        debug!(
            "risk evaluation for {}: {} alert(s) from {} budget(s)",
            account_id,
            alerts.len(),
            budgets.len()
        );
        alerts
    }
}

/// The three-way band split. Returns `None` when the forecast
/// confidently clears the floor.
fn band_split(
    threshold: Decimal,
    lower: Decimal,
    upper: Decimal,
    lead_time: u32,
    config: &RiskConfig,
) -> Option<Severity> {
    if threshold > upper {
        // Even the optimistic edge of the band breaches: likely.
        Some(Severity::Critical)
    } else if threshold > lower {
        // Breach is possible but not certain.
        if lead_time >= config.far_horizon {
            Some(Severity::Info)
        } else {
            Some(Severity::Warning)
        }
    } else {
        None
    }
}

/// Running projected balance for one period: opening balance plus
/// cumulative net, at the pessimistic edge, the point estimate, and
/// the optimistic edge of the band.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProjectedBalance {
    pub(crate) lower: Decimal,
    pub(crate) point: Decimal,
    pub(crate) upper: Decimal,
}

/// Cumulative projected balance per period across all categories.
/// Shared with insight composition so alert severities and reported
/// shortfalls are read off the same series.
pub(crate) fn cumulative_balance(
    net_forecasts: &[NetForecast],
    opening_balance_minor: i64,
) -> Vec<(NaiveDate, ProjectedBalance)> {
    let mut per_period: BTreeMap<NaiveDate, (Decimal, Decimal, Decimal)> = BTreeMap::new();
    for net in net_forecasts {
        for p in &net.periods {
            let entry = per_period
                .entry(p.period_start)
                .or_insert((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));
            entry.0 += p.net_lower;
            entry.1 += p.net_point;
            entry.2 += p.net_upper;
        }
    }

    let opening = Decimal::from(opening_balance_minor);
    let mut balance = ProjectedBalance {
        lower: opening,
        point: opening,
        upper: opening,
    };
    per_period
        .into_iter()
        .map(|(period, (net_lower, net_point, net_upper))| {
            balance.lower += net_lower;
            balance.point += net_point;
            balance.upper += net_upper;
            (period, balance)
        })
        .collect()
}
