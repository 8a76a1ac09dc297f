use crate::core::account::{AccountId, Category, CurrencyCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single categorized cash-flow event.
///
/// Amounts are signed minor units (cents): positive for inflows,
/// negative for outflows. Transactions are immutable once created and
/// retained indefinitely for retraining and audit.
///
/// # Examples
///
/// ```
/// use forecash::core::transaction::Transaction;
/// use forecash::core::account::{AccountId, Category, CurrencyCode};
/// use chrono::{TimeZone, Utc};
///
/// let tx = Transaction::new(
///     AccountId::new("ACC-001"),
///     Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
///     -120_000,
///     Category::new("rent"),
///     CurrencyCode::new("EUR"),
/// );
///
/// assert_eq!(tx.amount_minor(), -120_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for this transaction.
    id: Uuid,
    /// The account this event belongs to.
    account_id: AccountId,
    /// When the event occurred.
    timestamp: DateTime<Utc>,
    /// Signed amount in minor units. Positive = inflow.
    amount_minor: i64,
    /// Spending or income category.
    category: Category,
    /// Currency of the amount.
    currency: CurrencyCode,
}

impl Transaction {
    pub fn new(
        account_id: AccountId,
        timestamp: DateTime<Utc>,
        amount_minor: i64,
        category: Category,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            timestamp,
            amount_minor,
            category,
            currency,
        }
    }

    /// Create a transaction with a specific ID (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        account_id: AccountId,
        timestamp: DateTime<Utc>,
        amount_minor: i64,
        category: Category,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            id,
            account_id,
            timestamp,
            amount_minor,
            category,
            currency,
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }
}

/// Append-only historical record of one account's transactions.
///
/// The substrate every other engine stage reads from. Ingestion may
/// deliver events out of order; consumers sort before aggregating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    pub fn append(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All unique categories referenced in this log, sorted.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .transactions
            .iter()
            .map(|t| t.category().clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// The latest event timestamp seen, if any. Callers use this as
    /// part of their aggregation cache key.
    pub fn max_timestamp(&self) -> Option<DateTime<Utc>> {
        self.transactions.iter().map(|t| t.timestamp()).max()
    }

    /// A copy of the transactions ordered by timestamp (stable for
    /// equal timestamps, so repeated calls agree).
    pub fn sorted_by_time(&self) -> Vec<Transaction> {
        let mut sorted = self.transactions.clone();
        sorted.sort_by_key(|t| t.timestamp());
        sorted
    }
}

impl FromIterator<Transaction> for TransactionLog {
    fn from_iter<T: IntoIterator<Item = Transaction>>(iter: T) -> Self {
        Self {
            transactions: iter.into_iter().collect(),
        }
    }
}
