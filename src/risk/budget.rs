use crate::core::account::{AccountId, Category};
use crate::core::period::Granularity;
use serde::{Deserialize, Serialize};

/// What a budget threshold applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetScope {
    /// Floor on a single category's forecast net flow per period.
    Category(Category),
    /// Floor on the account's cumulative projected balance — the
    /// liquidity constraint.
    Total,
}

/// A user-supplied spending floor.
///
/// Budgets are created and edited by the owning user through an
/// external service; the engine only reads the active set at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub account_id: AccountId,
    pub scope: BudgetScope,
    /// Minor units. A period (or balance) projected below this floor
    /// is a breach.
    pub threshold_minor: i64,
    pub granularity: Granularity,
}

impl Budget {
    pub fn for_category(
        account_id: AccountId,
        category: Category,
        threshold_minor: i64,
        granularity: Granularity,
    ) -> Self {
        Self {
            account_id,
            scope: BudgetScope::Category(category),
            threshold_minor,
            granularity,
        }
    }

    pub fn for_total(account_id: AccountId, threshold_minor: i64, granularity: Granularity) -> Self {
        Self {
            account_id,
            scope: BudgetScope::Total,
            threshold_minor,
            granularity,
        }
    }
}
