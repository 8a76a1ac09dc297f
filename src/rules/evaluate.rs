use crate::core::account::{AccountId, Category};
use crate::core::period::Granularity;
use crate::forecast::engine::ForecastSeries;
use crate::rules::ruleset::{RuleSet, TaxBracket};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One period of a net forecast: the gross forecast with tax and loan
/// withholdings applied to the point estimate and both bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetForecastPeriod {
    pub period_start: NaiveDate,
    pub gross_point: Decimal,
    pub gross_lower: Decimal,
    pub gross_upper: Decimal,
    pub net_point: Decimal,
    pub net_lower: Decimal,
    pub net_upper: Decimal,
}

/// Net disposable cash flow derived from a gross forecast and one
/// rule set version. Ties each period to the rule version that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetForecast {
    pub account_id: AccountId,
    pub category: Category,
    pub granularity: Granularity,
    /// Version tag of the rule set that was applied.
    pub applied_rule_version: String,
    pub periods: Vec<NetForecastPeriod>,
}

impl NetForecast {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Total withheld across the horizon (gross minus net, points).
    pub fn total_withheld(&self) -> Decimal {
        self.periods
            .iter()
            .map(|p| p.gross_point - p.net_point)
            .sum()
    }
}

/// Progressive marginal tax on a positive gross amount: each bracket
/// taxes only the slice of income inside its range. Non-positive
/// gross carries no tax.
fn tax_on(gross: Decimal, brackets: &[TaxBracket]) -> Decimal {
    if gross <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut tax = Decimal::ZERO;
    for bracket in brackets {
        let floor = Decimal::from(bracket.floor_minor);
        if gross <= floor {
            break;
        }
        let ceiling = bracket
            .ceiling_minor
            .map(Decimal::from)
            .unwrap_or(gross)
            .min(gross);
        tax += (ceiling - floor) * bracket.marginal_rate;
    }
    tax
}

/// Net a single gross value through a rule set at a given period
/// offset from the forecast start. Monotone in `gross` for any rule
/// set that passes validation (marginal rates capped at 100%).
fn net_of(gross: Decimal, rules: &RuleSet, period_offset: usize) -> Decimal {
    let mut net = gross - tax_on(gross, &rules.brackets);
    for loan in &rules.loans {
        if (period_offset as u32) < loan.remaining_periods {
            net -= Decimal::from(loan.installment_minor);
        }
    }
    net
}

/// Apply a rule set to a gross forecast, producing the net forecast.
///
/// Pure: neither input is mutated, and exact `Decimal` arithmetic on
/// minor units keeps repeated evaluations bit-identical. Because
/// netting is monotone, applying it to the lower and upper bounds
/// preserves band ordering.
pub fn evaluate(gross: &ForecastSeries, rules: &RuleSet) -> NetForecast {
    let periods = gross
        .points
        .iter()
        .enumerate()
        .map(|(offset, point)| NetForecastPeriod {
            period_start: point.period_start,
            gross_point: point.point_estimate,
            gross_lower: point.lower_bound,
            gross_upper: point.upper_bound,
            net_point: net_of(point.point_estimate, rules, offset),
            net_lower: net_of(point.lower_bound, rules, offset),
            net_upper: net_of(point.upper_bound, rules, offset),
        })
        .collect();

    NetForecast {
        account_id: gross.account_id.clone(),
        category: gross.category.clone(),
        granularity: gross.granularity,
        applied_rule_version: rules.version.clone(),
        periods,
    }
}
