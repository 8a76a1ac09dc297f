//! Structured recommendation records composed from alerts and
//! forecast deltas.
//!
//! The last structured-data stage before an external presentation
//! layer renders prose: everything here is an enum or a number, never
//! free text.

use crate::core::account::Category;
use crate::risk::alert::{Alert, Severity};
use crate::risk::engine::cumulative_balance;
use crate::rules::evaluate::NetForecast;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an insight is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryKind {
    OverspendRisk,
    TaxImpact,
    SurplusOpportunity,
}

/// Recommended action, as a closed enum for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    ReduceCategorySpend,
    ReviewUpcomingCommitments,
    MoveFundsToBuffer,
    ReviewWithholding,
    AllocateSurplus,
}

/// A structured, human-consumable recommendation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub summary_kind: SummaryKind,
    /// `None` when the insight concerns the whole account.
    pub affected_category: Option<Category>,
    /// Size of the effect in minor units: projected shortfall,
    /// withheld total, or available surplus.
    pub magnitude_minor: Decimal,
    pub recommended_action_kind: ActionKind,
    /// Alerts that triggered this insight, if any.
    pub source_alert_ids: Vec<Uuid>,
}

/// Withheld share of positive gross above which tax impact becomes
/// worth surfacing on its own.
const TAX_IMPACT_SHARE: Decimal = Decimal::from_parts(25, 0, 0, false, 2); // 0.25

/// Compose insights from a run's alerts and net forecasts. The
/// opening balance anchors the projected balance that sizes
/// whole-account shortfalls.
pub fn compose(
    alerts: &[Alert],
    net_forecasts: &[NetForecast],
    opening_balance_minor: i64,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    // Overspend risk: one insight per alerted category (or the whole
    // account), sized by the worst projected shortfall.
    let mut seen: Vec<Option<Category>> = Vec::new();
    for alert in alerts
        .iter()
        .filter(|a| a.severity >= Severity::Warning)
    {
        if seen.contains(&alert.category) {
            continue;
        }
        seen.push(alert.category.clone());

        let related: Vec<&Alert> = alerts
            .iter()
            .filter(|a| a.category == alert.category && a.severity >= Severity::Warning)
            .collect();
        let shortfall = related
            .iter()
            .filter_map(|a| worst_shortfall(a, net_forecasts, opening_balance_minor))
            .max()
            .unwrap_or(Decimal::ZERO);

        insights.push(Insight {
            summary_kind: SummaryKind::OverspendRisk,
            affected_category: alert.category.clone(),
            magnitude_minor: shortfall,
            recommended_action_kind: match (&alert.category, related.iter().any(|a| a.severity == Severity::Critical)) {
                (Some(_), true) => ActionKind::ReduceCategorySpend,
                (Some(_), false) => ActionKind::ReviewUpcomingCommitments,
                (None, _) => ActionKind::MoveFundsToBuffer,
            },
            source_alert_ids: related.iter().map(|a| a.alert_id).collect(),
        });
    }

    // Tax impact: flag categories whose withholdings consume a large
    // share of forecasted positive gross.
    for net in net_forecasts {
        let positive_gross: Decimal = net
            .periods
            .iter()
            .map(|p| p.gross_point.max(Decimal::ZERO))
            .sum();
        let withheld = net.total_withheld();
        if positive_gross > Decimal::ZERO && withheld / positive_gross >= TAX_IMPACT_SHARE {
            insights.push(Insight {
                summary_kind: SummaryKind::TaxImpact,
                affected_category: Some(net.category.clone()),
                magnitude_minor: withheld,
                recommended_action_kind: ActionKind::ReviewWithholding,
                source_alert_ids: Vec::new(),
            });
        }
    }

    // Surplus opportunity: nothing breached and the horizon nets
    // positive overall.
    if alerts.iter().all(|a| a.severity < Severity::Warning) {
        let total_net: Decimal = net_forecasts
            .iter()
            .flat_map(|n| n.periods.iter())
            .map(|p| p.net_point)
            .sum();
        if total_net > Decimal::ZERO {
            insights.push(Insight {
                summary_kind: SummaryKind::SurplusOpportunity,
                affected_category: None,
                magnitude_minor: total_net,
                recommended_action_kind: ActionKind::AllocateSurplus,
                source_alert_ids: Vec::new(),
            });
        }
    }

    insights
}

/// How far below the alert's floor the point forecast lands in the
/// breach period, as a positive magnitude.
///
/// Category alerts compare the floor against that category's net flow
/// in the breach period. Whole-account alerts guard a balance floor,
/// so they compare it against the projected cumulative balance there,
/// the same series the risk engine graded the alert on.
fn worst_shortfall(
    alert: &Alert,
    net_forecasts: &[NetForecast],
    opening_balance_minor: i64,
) -> Option<Decimal> {
    let threshold = Decimal::from(alert.threshold_minor);
    match &alert.category {
        Some(category) => net_forecasts
            .iter()
            .filter(|n| &n.category == category)
            .flat_map(|n| n.periods.iter())
            .filter(|p| p.period_start == alert.projected_breach_period)
            .map(|p| (threshold - p.net_point).max(Decimal::ZERO))
            .max(),
        None => cumulative_balance(net_forecasts, opening_balance_minor)
            .into_iter()
            .find(|(period, _)| *period == alert.projected_breach_period)
            .map(|(_, balance)| (threshold - balance.point).max(Decimal::ZERO)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountId;
    use crate::core::period::Granularity;
    use crate::risk::alert::AlertStatus;
    use crate::rules::evaluate::NetForecastPeriod;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, 1).unwrap()
    }

    fn net_forecast(category: &str, periods: Vec<(u32, Decimal, Decimal)>) -> NetForecast {
        NetForecast {
            account_id: AccountId::new("ACC-001"),
            category: Category::new(category),
            granularity: Granularity::Monthly,
            applied_rule_version: "2025".to_string(),
            periods: periods
                .into_iter()
                .map(|(m, gross, net)| NetForecastPeriod {
                    period_start: date(m),
                    gross_point: gross,
                    gross_lower: gross,
                    gross_upper: gross,
                    net_point: net,
                    net_lower: net,
                    net_upper: net,
                })
                .collect(),
        }
    }

    fn alert(category: &str, month: u32, severity: Severity, threshold: i64) -> Alert {
        Alert {
            alert_id: Uuid::new_v4(),
            account_id: AccountId::new("ACC-001"),
            category: Some(Category::new(category)),
            severity,
            projected_breach_period: date(month),
            lead_time_periods: 1,
            threshold_minor: threshold,
            generating_forecast_version: "smoothing-v1/run-1".to_string(),
            status: AlertStatus::Pending,
            superseded_by: None,
        }
    }

    #[test]
    fn test_overspend_insight_from_critical_alert() {
        let net = net_forecast("dining", vec![(2, dec!(-28000), dec!(-28000))]);
        let alerts = vec![alert("dining", 2, Severity::Critical, -25_000)];

        let insights = compose(&alerts, &[net], 0);
        assert_eq!(insights.len(), 1);
        let insight = &insights[0];
        assert_eq!(insight.summary_kind, SummaryKind::OverspendRisk);
        assert_eq!(insight.affected_category, Some(Category::new("dining")));
        assert_eq!(insight.magnitude_minor, dec!(3000));
        assert_eq!(insight.recommended_action_kind, ActionKind::ReduceCategorySpend);
        assert_eq!(insight.source_alert_ids.len(), 1);
    }

    #[test]
    fn test_total_alert_sized_by_projected_balance() {
        // Two categories each drain 10000 in months 2 and 3 from a
        // 50000 opening balance, against a 15000 balance floor. Month
        // 3 projects 10000, so the shortfall is 5000; no single
        // period's net flow enters into it.
        let groceries = net_forecast(
            "groceries",
            vec![(2, dec!(-10000), dec!(-10000)), (3, dec!(-10000), dec!(-10000))],
        );
        let rent = net_forecast(
            "rent",
            vec![(2, dec!(-10000), dec!(-10000)), (3, dec!(-10000), dec!(-10000))],
        );
        let mut total = alert("unused", 3, Severity::Critical, 15_000);
        total.category = None;

        let insights = compose(&[total], &[groceries, rent], 50_000);
        let overspend = insights
            .iter()
            .find(|i| i.summary_kind == SummaryKind::OverspendRisk)
            .unwrap();
        assert_eq!(overspend.affected_category, None);
        assert_eq!(overspend.magnitude_minor, dec!(5000));
        assert_eq!(overspend.recommended_action_kind, ActionKind::MoveFundsToBuffer);
    }

    #[test]
    fn test_warning_only_suggests_review() {
        let net = net_forecast("dining", vec![(2, dec!(-26000), dec!(-26000))]);
        let alerts = vec![alert("dining", 2, Severity::Warning, -25_000)];
        let insights = compose(&alerts, &[net], 0);
        assert_eq!(
            insights[0].recommended_action_kind,
            ActionKind::ReviewUpcomingCommitments
        );
    }

    #[test]
    fn test_info_alerts_compose_nothing() {
        let net = net_forecast("dining", vec![(2, dec!(-20000), dec!(-20000))]);
        let alerts = vec![alert("dining", 2, Severity::Info, -25_000)];
        let insights = compose(&alerts, &[net], 0);
        assert!(insights
            .iter()
            .all(|i| i.summary_kind != SummaryKind::OverspendRisk));
    }

    #[test]
    fn test_tax_impact_on_heavy_withholding() {
        // 30% of gross withheld, above the 25% share.
        let net = net_forecast("salary", vec![(2, dec!(10000), dec!(7000))]);
        let insights = compose(&[], &[net], 0);
        let tax = insights
            .iter()
            .find(|i| i.summary_kind == SummaryKind::TaxImpact)
            .unwrap();
        assert_eq!(tax.magnitude_minor, dec!(3000));
        assert_eq!(tax.recommended_action_kind, ActionKind::ReviewWithholding);
    }

    #[test]
    fn test_surplus_when_everything_clears() {
        let salary = net_forecast("salary", vec![(2, dec!(10000), dec!(9000))]);
        let rent = net_forecast("rent", vec![(2, dec!(-4000), dec!(-4000))]);
        let insights = compose(&[], &[salary, rent], 0);
        let surplus = insights
            .iter()
            .find(|i| i.summary_kind == SummaryKind::SurplusOpportunity)
            .unwrap();
        assert_eq!(surplus.magnitude_minor, dec!(5000));
        assert_eq!(surplus.recommended_action_kind, ActionKind::AllocateSurplus);
    }

    #[test]
    fn test_no_surplus_when_alerted() {
        let net = net_forecast("dining", vec![(2, dec!(5000), dec!(5000))]);
        let alerts = vec![alert("dining", 2, Severity::Warning, -25_000)];
        let insights = compose(&alerts, &[net], 0);
        assert!(insights
            .iter()
            .all(|i| i.summary_kind != SummaryKind::SurplusOpportunity));
    }
}
