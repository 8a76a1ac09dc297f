use crate::core::account::{AccountId, RegionCode};
use chrono::NaiveDate;
use thiserror::Error;

/// Error taxonomy of the forecasting engine.
///
/// Errors for one account never abort runs for other accounts; the
/// pipeline isolates failures per account and leaves previously
/// published state untouched.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Too little history to fit a model. Recoverable once more
    /// transactions arrive; never retried automatically.
    #[error("insufficient history for {account}/{category}: {observed} observed periods, need {required}")]
    InsufficientHistory {
        account: AccountId,
        category: String,
        observed: usize,
        required: usize,
    },

    /// Input outside the requested aggregation window. A caller bug,
    /// surfaced immediately and never retried.
    #[error("transaction at {timestamp} outside requested range {start}..{end}")]
    Range {
        timestamp: chrono::DateTime<chrono::Utc>,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// No rule set covers the region and as-of date. A configuration
    /// gap for an operator; the engine never falls back to a default
    /// region's rules.
    #[error("no rule set covers region {region} as of {as_of}")]
    NoApplicableRuleSet {
        region: RegionCode,
        as_of: NaiveDate,
    },

    /// A rule set failed validation (mis-ordered brackets, overlapping
    /// effective ranges, or a non-monotonic net function).
    #[error("invalid rule set for region {region}: {reason}")]
    InvalidRuleSet { region: RegionCode, reason: String },

    /// Internal model fit produced a non-finite intermediate. Callers
    /// never see this for valid input: the forecaster catches it and
    /// refits with the degraded fallback model.
    #[error("numerical instability during {stage}")]
    NumericalInstability { stage: &'static str },

    /// A run was cancelled by deadline or explicit request before it
    /// could publish. Nothing was written.
    #[error("forecast run cancelled for {account}")]
    Cancelled { account: AccountId },
}
