//! Per-account run orchestration: versioned publication, scheduling,
//! and cancellation.

pub mod run;
pub mod scheduler;
