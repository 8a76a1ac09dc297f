use crate::core::period::Granularity;
use crate::series::aggregate::AggregatedSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of forecasting strategies.
///
/// Selection is a pure function of the input series, so a given series
/// always routes to the same model — no runtime registry, no hidden
/// randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Holt linear exponential smoothing. The default for short or
    /// non-seasonal histories.
    Smoothing,
    /// Smoothing plus additive per-season-index offsets. Requires at
    /// least two full seasonal cycles of history.
    Seasonal,
    /// Last-value carry-forward with wide bands. Chosen only when a
    /// primary fit degrades numerically.
    Fallback,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelKind::Smoothing => "smoothing",
            ModelKind::Seasonal => "seasonal",
            ModelKind::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Identifies the model that produced a forecast.
///
/// `degraded` is set when the primary fit hit numerical instability
/// and the engine fell back, so downstream consumers know the bands
/// carry reduced confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub kind: ModelKind,
    pub revision: u32,
    pub degraded: bool,
}

/// Current revision of the model implementations. Bumped whenever the
/// fitting math changes, so stored forecasts remain attributable.
pub const MODEL_REVISION: u32 = 1;

impl ModelVersion {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            revision: MODEL_REVISION,
            degraded: false,
        }
    }

    pub fn degraded(kind: ModelKind) -> Self {
        Self {
            kind,
            revision: MODEL_REVISION,
            degraded: true,
        }
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.kind, self.revision)?;
        if self.degraded {
            write!(f, "+degraded")?;
        }
        Ok(())
    }
}

/// Minimum autocorrelation at the seasonal lag to count as a
/// seasonality signal.
const SEASONALITY_THRESHOLD: f64 = 0.3;

/// Pure model selection: seasonal when the history covers at least two
/// full cycles and shows autocorrelation at the season lag, smoothing
/// otherwise. Never selects `Fallback` — that is an engine decision on
/// fit failure, not an input property.
pub fn select_model(series: &AggregatedSeries) -> ModelKind {
    let season = series.granularity.season_length();
    if series.len() >= 2 * season && has_seasonal_signal(&series.values(), season) {
        ModelKind::Seasonal
    } else {
        ModelKind::Smoothing
    }
}

/// Autocorrelation of the series at `lag`, against the threshold.
/// Zero-variance input has no signal by definition.
fn has_seasonal_signal(values: &[i64], lag: usize) -> bool {
    if values.len() < 2 * lag {
        return false;
    }
    let xs: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    let denom: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
    if denom == 0.0 {
        return false;
    }
    let numer: f64 = xs
        .windows(lag + 1)
        .map(|w| (w[0] - mean) * (w[lag] - mean))
        .sum();
    numer / denom >= SEASONALITY_THRESHOLD
}

/// Season index (0-based position within the cycle) of a period at
/// `offset` periods past the start of the history.
pub fn season_index(granularity: Granularity, offset: usize) -> usize {
    offset % granularity.season_length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::{AccountId, Category};
    use crate::series::aggregate::{AggregatedPeriod, Coverage};
    use chrono::NaiveDate;

    fn series(values: &[i64], granularity: Granularity) -> AggregatedSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let periods = values
            .iter()
            .enumerate()
            .map(|(i, &net)| AggregatedPeriod {
                period_start: granularity.advance(start, i as i64),
                net_minor: net,
                observation_count: 1,
                coverage: Coverage::Observed,
            })
            .collect();
        AggregatedSeries {
            account_id: AccountId::new("ACC-001"),
            category: Category::new("groceries"),
            granularity,
            history_start: start,
            periods,
        }
    }

    #[test]
    fn test_short_history_selects_smoothing() {
        let s = series(&[-100, -120, -110, -105], Granularity::Monthly);
        assert_eq!(select_model(&s), ModelKind::Smoothing);
    }

    #[test]
    fn test_strong_seasonal_pattern_selected() {
        // Two years of monthly data with a pronounced annual cycle.
        let mut values = Vec::new();
        for _ in 0..2 {
            for month in 0..12i64 {
                let seasonal = if month == 11 { -50_000 } else { -10_000 };
                values.push(seasonal);
            }
        }
        let s = series(&values, Granularity::Monthly);
        assert_eq!(select_model(&s), ModelKind::Seasonal);
    }

    #[test]
    fn test_flat_long_history_stays_smoothing() {
        let values = vec![-10_000i64; 30];
        let s = series(&values, Granularity::Monthly);
        assert_eq!(select_model(&s), ModelKind::Smoothing);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let s = series(&[-100, -120, -110, -105, -130, -90], Granularity::Monthly);
        let first = select_model(&s);
        for _ in 0..10 {
            assert_eq!(select_model(&s), first);
        }
    }

    #[test]
    fn test_model_version_display() {
        assert_eq!(ModelVersion::new(ModelKind::Seasonal).to_string(), "seasonal-v1");
        assert_eq!(
            ModelVersion::degraded(ModelKind::Fallback).to_string(),
            "fallback-v1+degraded"
        );
    }
}
