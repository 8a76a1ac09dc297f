//! Deterministic probabilistic forecasting over aggregated series.

pub mod engine;
pub mod model;
