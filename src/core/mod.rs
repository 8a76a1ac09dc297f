//! Foundational domain types: accounts, categories, transactions, periods.

pub mod account;
pub mod period;
pub mod transaction;
