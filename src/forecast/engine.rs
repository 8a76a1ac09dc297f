use crate::core::account::{AccountId, Category};
use crate::core::period::Granularity;
use crate::error::EngineError;
use crate::forecast::model::{select_model, ModelKind, ModelVersion};
use crate::series::aggregate::AggregatedSeries;
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tuning knobs for a forecasting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of future periods to produce.
    pub horizon: usize,
    /// Two-sided confidence level of the uncertainty band.
    pub confidence: f64,
    /// Minimum number of aggregated periods required to fit.
    pub min_history: usize,
    /// Smoothing factor for the level component.
    pub alpha: f64,
    /// Smoothing factor for the trend component.
    pub beta: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 6,
            confidence: 0.80,
            min_history: 3,
            alpha: 0.5,
            beta: 0.3,
        }
    }
}

/// One forecasted period: central prediction plus uncertainty band.
///
/// Invariant: `lower_bound <= point_estimate <= upper_bound`, enforced
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period_start: NaiveDate,
    pub point_estimate: Decimal,
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
}

impl ForecastPoint {
    /// Build a point from a center and a non-negative half-width,
    /// rounding to hundredths of a minor unit.
    fn from_center_width(period_start: NaiveDate, center: f64, half_width: f64) -> Self {
        let width = half_width.max(0.0);
        let point = to_decimal(center);
        let lower = to_decimal(center - width);
        let upper = to_decimal(center + width);
        Self {
            period_start,
            point_estimate: point,
            lower_bound: lower.min(point),
            upper_bound: upper.max(point),
        }
    }

    /// Band width (upper minus lower).
    pub fn band_width(&self) -> Decimal {
        self.upper_bound - self.lower_bound
    }
}

/// A probabilistic forecast for one account/category.
///
/// Immutable once emitted; later runs supersede it with a new version
/// rather than editing it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub account_id: AccountId,
    pub category: Category,
    pub granularity: Granularity,
    pub model_version: ModelVersion,
    /// Exactly `horizon` consecutive points, aligned to the input
    /// series' granularity.
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }
}

/// Internal result of fitting one model to one series.
struct Fit {
    level: f64,
    trend: f64,
    /// Additive per-season-index offsets; empty for non-seasonal fits.
    seasonal: Vec<f64>,
    /// One-step-ahead residual standard deviation.
    sigma: f64,
}

/// The forecasting engine.
///
/// Deterministic: the same series and config always produce the same
/// forecast. A fit that turns numerically unstable is caught here and
/// replaced with the carry-forward fallback, flagged in the model
/// version — valid, sufficiently long input never surfaces an error.
pub struct Forecaster;

impl Forecaster {
    /// Forecast `config.horizon` periods past the end of `series`.
    ///
    /// Fails with [`EngineError::InsufficientHistory`] below
    /// `config.min_history` observed periods. Zero-filled gap periods
    /// keep the series aligned but carry no information, so they do
    /// not count toward the minimum.
    pub fn forecast(
        series: &AggregatedSeries,
        config: &ForecastConfig,
    ) -> Result<ForecastSeries, EngineError> {
        let observed = series.observed_count();
        if observed < config.min_history {
            return Err(EngineError::InsufficientHistory {
                account: series.account_id.clone(),
                category: series.category.to_string(),
                observed,
                required: config.min_history,
            });
        }

        let kind = select_model(series);
        let (version, fit) = match Self::fit(series, kind, config) {
            Ok(fit) => (ModelVersion::new(kind), fit),
            Err(EngineError::NumericalInstability { stage }) => {
                warn!(
                    "{}/{}: {} fit unstable at {}, degrading to fallback",
                    series.account_id, series.category, kind, stage
                );
                let fit = Self::fit(series, ModelKind::Fallback, config)?;
                (ModelVersion::degraded(ModelKind::Fallback), fit)
            }
            Err(other) => return Err(other),
        };

        let z = z_score(config.confidence);
        let season = series.granularity.season_length();
        let first_period = series
            .next_period_start()
            .unwrap_or(series.history_start);

        let mut points = Vec::with_capacity(config.horizon);
        let mut prev_width = 0.0f64;
        for h in 1..=config.horizon {
            let mut center = fit.level + fit.trend * h as f64;
            if !fit.seasonal.is_empty() {
                let idx = (series.len() + h - 1) % season;
                center += fit.seasonal[idx];
            }
            // Farther periods carry more uncertainty: grow the band
            // with sqrt(h) and clamp it to never shrink.
            let width = (z * fit.sigma * (h as f64).sqrt()).max(prev_width);
            prev_width = width;

            let period_start = series.granularity.advance(first_period, (h - 1) as i64);
            points.push(ForecastPoint::from_center_width(period_start, center, width));
        }

        debug!(
            "forecast {}/{}: {} over {} periods (sigma {:.2})",
            series.account_id, series.category, version, config.horizon, fit.sigma
        );

        Ok(ForecastSeries {
            account_id: series.account_id.clone(),
            category: series.category.clone(),
            granularity: series.granularity,
            model_version: version,
            points,
        })
    }

    fn fit(
        series: &AggregatedSeries,
        kind: ModelKind,
        config: &ForecastConfig,
    ) -> Result<Fit, EngineError> {
        let xs: Vec<f64> = series.values().iter().map(|&v| v as f64).collect();
        let fit = match kind {
            ModelKind::Smoothing => {
                let (level, trend, sigma) = holt(&xs, config.alpha, config.beta);
                Fit {
                    level,
                    trend,
                    seasonal: Vec::new(),
                    sigma,
                }
            }
            ModelKind::Seasonal => {
                let season = series.granularity.season_length();
                let seasonal = seasonal_offsets(&xs, season);
                let deseasonalized: Vec<f64> = xs
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| x - seasonal[i % season])
                    .collect();
                let (level, trend, sigma) = holt(&deseasonalized, config.alpha, config.beta);
                Fit {
                    level,
                    trend,
                    seasonal,
                    sigma,
                }
            }
            ModelKind::Fallback => {
                let level = *xs.last().unwrap_or(&0.0);
                // Deliberately wide: twice the full-sample deviation,
                // since the fallback carries no model structure.
                let sigma = 2.0 * std_dev(&xs);
                Fit {
                    level,
                    trend: 0.0,
                    seasonal: Vec::new(),
                    sigma,
                }
            }
        };

        if !fit.level.is_finite() || !fit.trend.is_finite() {
            return Err(EngineError::NumericalInstability { stage: "trend fit" });
        }
        if !fit.sigma.is_finite() || fit.seasonal.iter().any(|s| !s.is_finite()) {
            return Err(EngineError::NumericalInstability {
                stage: "residual variance",
            });
        }
        Ok(fit)
    }
}

/// Holt's linear exponential smoothing. Returns the final level and
/// trend plus the one-step-ahead residual standard deviation.
fn holt(xs: &[f64], alpha: f64, beta: f64) -> (f64, f64, f64) {
    let mut level = xs[0];
    let mut trend = if xs.len() > 1 { xs[1] - xs[0] } else { 0.0 };
    let mut errors = Vec::with_capacity(xs.len());

    for &x in &xs[1..] {
        let predicted = level + trend;
        errors.push(x - predicted);
        let new_level = alpha * x + (1.0 - alpha) * predicted;
        trend = beta * (new_level - level) + (1.0 - beta) * trend;
        level = new_level;
    }

    (level, trend, std_dev(&errors))
}

/// Additive seasonal offsets: mean per season index minus the global
/// mean, over however many complete or partial cycles are present.
fn seasonal_offsets(xs: &[f64], season: usize) -> Vec<f64> {
    let global_mean = xs.iter().sum::<f64>() / xs.len() as f64;
    let mut sums = vec![0.0f64; season];
    let mut counts = vec![0usize; season];
    for (i, &x) in xs.iter().enumerate() {
        sums[i % season] += x;
        counts[i % season] += 1;
    }
    sums.iter()
        .zip(&counts)
        .map(|(&sum, &count)| {
            if count == 0 {
                0.0
            } else {
                sum / count as f64 - global_mean
            }
        })
        .collect()
}

/// Sample standard deviation; zero for fewer than two values, so a
/// degenerate all-same series collapses its band rather than erroring.
fn std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    variance.sqrt()
}

/// Two-sided z-score for a confidence level, via the Beasley-Springer-
/// Moro rational approximation of the normal quantile.
fn z_score(confidence: f64) -> f64 {
    let p = (1.0 + confidence.clamp(0.0, 0.9999)) / 2.0;
    // Coefficients for the central region |p - 0.5| <= 0.42.
    const A: [f64; 4] = [2.50662823884, -18.61500062529, 41.39119773534, -25.44106049637];
    const B: [f64; 4] = [-8.47351093090, 23.08336743743, -21.06224101826, 3.13082909833];
    const C: [f64; 9] = [
        0.3374754822726147,
        0.9761690190917186,
        0.1607979714918209,
        0.0276438810333863,
        0.0038405729373609,
        0.0003951896511919,
        0.0000321767881768,
        0.0000002888167364,
        0.0000003960315187,
    ];
    let y = p - 0.5;
    if y.abs() <= 0.42 {
        let r = y * y;
        let numer = y * (((A[3] * r + A[2]) * r + A[1]) * r + A[0]);
        let denom = (((B[3] * r + B[2]) * r + B[1]) * r + B[0]) * r + 1.0;
        numer / denom
    } else {
        let mut r = if y > 0.0 { 1.0 - p } else { p };
        r = (-r.ln()).ln();
        let mut x = C[0];
        let mut power = 1.0;
        for &c in &C[1..] {
            power *= r;
            x += c * power;
        }
        if y < 0.0 {
            -x
        } else {
            x
        }
    }
}

fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64_retain(v)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::aggregate::{AggregatedPeriod, Coverage};
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn series(values: &[i64]) -> AggregatedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let granularity = Granularity::Monthly;
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
    fn test_insufficient_history() {
        let s = series(&[-100, -200]);
        let result = Forecaster::forecast(&s, &ForecastConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::InsufficientHistory { observed: 2, required: 3, .. })
        ));
    }

    #[test]
    fn test_gap_fills_do_not_count_toward_minimum() {
        // Four aligned periods but only two carry observations; the
        // zero-filled gaps must not satisfy the history minimum.
        let mut s = series(&[-100, 0, 0, -200]);
        for p in &mut s.periods[1..3] {
            p.observation_count = 0;
            p.coverage = Coverage::NoActivity;
        }
        assert_eq!(s.len(), 4);
        assert_eq!(s.observed_count(), 2);

        let result = Forecaster::forecast(&s, &ForecastConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::InsufficientHistory { observed: 2, required: 3, .. })
        ));
    }

    #[test]
    fn test_horizon_and_band_ordering() {
        let s = series(&[-200_00, -180_00, -220_00, -190_00, -210_00, -205_00]);
        let config = ForecastConfig {
            horizon: 4,
            ..Default::default()
        };
        let forecast = Forecaster::forecast(&s, &config).unwrap();
        assert_eq!(forecast.horizon(), 4);
        for p in forecast.points() {
            assert!(p.lower_bound <= p.point_estimate);
            assert!(p.point_estimate <= p.upper_bound);
        }
    }

    #[test]
    fn test_band_width_non_decreasing() {
        let s = series(&[-200_00, -180_00, -220_00, -190_00, -210_00, -205_00]);
        let config = ForecastConfig {
            horizon: 8,
            ..Default::default()
        };
        let forecast = Forecaster::forecast(&s, &config).unwrap();
        let widths: Vec<Decimal> = forecast.points().iter().map(|p| p.band_width()).collect();
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0], "band must not shrink: {:?}", widths);
        }
    }

    #[test]
    fn test_zero_variance_collapses_band() {
        let s = series(&[-150_00; 6]);
        let forecast = Forecaster::forecast(&s, &ForecastConfig::default()).unwrap();
        for p in forecast.points() {
            assert_eq!(p.point_estimate, dec!(-15000));
            assert_eq!(p.lower_bound, p.point_estimate);
            assert_eq!(p.upper_bound, p.point_estimate);
        }
    }

    #[test]
    fn test_forecast_periods_continue_series() {
        let s = series(&[-100, -110, -105, -95]);
        let forecast = Forecaster::forecast(&s, &ForecastConfig::default()).unwrap();
        assert_eq!(
            forecast.points()[0].period_start,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(
            forecast.points()[1].period_start,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn test_deterministic_across_runs() {
        let s = series(&[-200_00, -180_00, -220_00, -190_00, -210_00]);
        let config = ForecastConfig::default();
        let first = Forecaster::forecast(&s, &config).unwrap();
        let second = Forecaster::forecast(&s, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unstable_fit_degrades_to_fallback() {
        let s = series(&[-100_00, -120_00, -90_00, -110_00]);
        // A NaN smoothing factor poisons the primary fit; the engine
        // must degrade instead of surfacing the instability.
        let config = ForecastConfig {
            alpha: f64::NAN,
            ..Default::default()
        };
        let forecast = Forecaster::forecast(&s, &config).unwrap();
        assert_eq!(forecast.model_version.kind, ModelKind::Fallback);
        assert!(forecast.model_version.degraded);
        for p in forecast.points() {
            assert!(p.lower_bound <= p.point_estimate);
            assert!(p.point_estimate <= p.upper_bound);
        }
    }

    #[test]
    fn test_seasonal_model_tracks_cycle() {
        // Two years of monthly rent-like data with a December spike.
        let mut values = Vec::new();
        for _ in 0..2 {
            for month in 0..12usize {
                values.push(if month == 11 { -60_000 } else { -10_000 });
            }
        }
        let s = series(&values);
        let config = ForecastConfig {
            horizon: 12,
            ..Default::default()
        };
        let forecast = Forecaster::forecast(&s, &config).unwrap();
        assert_eq!(forecast.model_version.kind, ModelKind::Seasonal);

        // The forecasted December (11 periods ahead of January) must
        // sit well below the forecasted months around it.
        let december = &forecast.points()[11];
        let november = &forecast.points()[10];
        assert!(december.point_estimate < november.point_estimate - dec!(20000));
    }

    #[test]
    fn test_z_score_reference_values() {
        assert_relative_eq!(z_score(0.80), 1.2816, max_relative = 1e-3);
        assert_relative_eq!(z_score(0.90), 1.6449, max_relative = 1e-3);
        assert_relative_eq!(z_score(0.95), 1.9600, max_relative = 1e-3);
    }

    #[test]
    fn test_holt_tracks_linear_trend() {
        let xs: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
        let (level, trend, sigma) = holt(&xs, 0.5, 0.3);
        assert_relative_eq!(level, 190.0, max_relative = 0.05);
        assert_relative_eq!(trend, 10.0, max_relative = 0.2);
        assert!(sigma < 1.0);
    }
}
