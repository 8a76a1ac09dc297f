//! Budget breach detection, alert lifecycle, and deduplication.

pub mod alert;
pub mod budget;
pub mod engine;
