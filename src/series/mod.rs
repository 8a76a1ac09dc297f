//! Aggregation of raw transactions into gap-free per-period series.

pub mod aggregate;
