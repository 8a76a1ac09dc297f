//! Synthetic transaction histories for testing and benchmarking.

pub mod generator;
