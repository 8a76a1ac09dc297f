//! Region-versioned tax and loan rule sets and their evaluation.

pub mod evaluate;
pub mod ruleset;
