//! # forecash
//!
//! Cash flow forecasting and proactive overspend risk engine.
//!
//! Given a per-account log of categorized transactions, the engine
//! aggregates them into regular time series, fits a deterministic
//! forecasting model with uncertainty bands, applies region-specific
//! tax and loan rules to derive net disposable cash flow, and raises
//! typed overspend alerts against user budgets.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: accounts, transactions, categories, periods
//! - **series** — Aggregation of raw transactions into gap-free period series
//! - **forecast** — Deterministic forecasting models with uncertainty bands
//! - **rules** — Region-versioned tax bracket and loan rule evaluation
//! - **risk** — Budget breach detection and alert lifecycle
//! - **insight** — Structured recommendation records from alerts and deltas
//! - **pipeline** — Per-account run orchestration, versioned store, scheduling
//! - **simulation** — Synthetic transaction histories for stress testing

pub mod core;
pub mod error;
pub mod forecast;
pub mod insight;
pub mod pipeline;
pub mod risk;
pub mod rules;
pub mod series;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::account::{Account, AccountId, Category, RegionCode};
    pub use crate::core::period::Granularity;
    pub use crate::core::transaction::{Transaction, TransactionLog};
    pub use crate::error::EngineError;
    pub use crate::forecast::engine::{ForecastConfig, ForecastSeries, Forecaster};
    pub use crate::pipeline::run::{ForecastStore, Pipeline, PipelineConfig};
    pub use crate::risk::alert::{Alert, AlertStatus, Severity};
    pub use crate::risk::budget::{Budget, BudgetScope};
    pub use crate::rules::ruleset::{RuleSet, RuleSetRegistry};
}
