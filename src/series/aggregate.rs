use crate::core::account::{AccountId, Category};
use crate::core::period::Granularity;
use crate::core::transaction::TransactionLog;
use crate::error::EngineError;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Whether a period's value was observed or synthesized as a gap fill.
///
/// `NoActivity` marks a period inside the covered window with no
/// transactions — distinct from periods before `history_start`, which
/// carry no data at all and are not part of any series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Observed,
    NoActivity,
}

/// One aggregated period of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedPeriod {
    /// Canonical start of the period (aligned to the granularity).
    pub period_start: NaiveDate,
    /// Exact sum of signed minor-unit amounts in this period.
    pub net_minor: i64,
    /// Number of transactions observed in this period.
    pub observation_count: u32,
    /// Observed data or a zero gap fill.
    pub coverage: Coverage,
}

/// A gap-free, ordered per-period aggregation of one account/category.
///
/// Derived data: recomputed on each forecasting run and rebuildable
/// from the transaction log at any time. Re-running on identical input
/// yields an identical value (the basis of caller-side caching).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub account_id: AccountId,
    pub category: Category,
    pub granularity: Granularity,
    /// First period for which data exists at all.
    pub history_start: NaiveDate,
    /// Consecutive periods from `history_start`, no gaps.
    pub periods: Vec<AggregatedPeriod>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Periods with at least one observed transaction.
    pub fn observed_count(&self) -> usize {
        self.periods
            .iter()
            .filter(|p| p.coverage == Coverage::Observed)
            .count()
    }

    /// Net values in period order, as exact minor units.
    pub fn values(&self) -> Vec<i64> {
        self.periods.iter().map(|p| p.net_minor).collect()
    }

    /// The period start immediately after the last aggregated period.
    pub fn next_period_start(&self) -> Option<NaiveDate> {
        self.periods
            .last()
            .map(|p| self.granularity.advance(p.period_start, 1))
    }
}

/// Aggregate one account/category slice of a transaction log into a
/// gap-free series over `[range_start, range_end)` period starts.
///
/// Pure and deterministic: sorts the input by timestamp (ingestion may
/// deliver out of order), sums exact minor units per period, and fills
/// interior gaps with zero-valued `NoActivity` periods. Transactions
/// outside the requested range fail with [`EngineError::Range`] —
/// out-of-window input is a caller bug, not data to be clamped.
pub fn aggregate(
    log: &TransactionLog,
    account_id: &AccountId,
    category: &Category,
    granularity: Granularity,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<AggregatedSeries, EngineError> {
    let window_start = granularity.floor(range_start);
    let sorted = log.sorted_by_time();

    let mut first_period: Option<NaiveDate> = None;
    let mut last_period: Option<NaiveDate> = None;

    // (period_start -> (net, count)), built in one ordered pass
    let mut totals: std::collections::BTreeMap<NaiveDate, (i64, u32)> =
        std::collections::BTreeMap::new();

    for tx in sorted
        .iter()
        .filter(|t| t.account_id() == account_id && t.category() == category)
    {
        let date = tx.timestamp().date_naive();
        if date < range_start || date >= range_end {
            return Err(EngineError::Range {
                timestamp: tx.timestamp(),
                start: range_start,
                end: range_end,
            });
        }
        let period = granularity.period_start(tx.timestamp());
        let entry = totals.entry(period).or_insert((0, 0));
        entry.0 += tx.amount_minor();
        entry.1 += 1;

        first_period = Some(first_period.map_or(period, |f: NaiveDate| f.min(period)));
        last_period = Some(last_period.map_or(period, |l: NaiveDate| l.max(period)));
    }

    // No matching transactions: no data yet, as opposed to no activity.
    let (history_start, history_end) = match (first_period, last_period) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Ok(AggregatedSeries {
                account_id: account_id.clone(),
                category: category.clone(),
                granularity,
                history_start: window_start,
                periods: Vec::new(),
            });
        }
    };

    let mut periods = Vec::new();
    let mut cursor = history_start;
    while cursor <= history_end {
        let period = match totals.get(&cursor) {
            Some(&(net, count)) => AggregatedPeriod {
                period_start: cursor,
                net_minor: net,
                observation_count: count,
                coverage: Coverage::Observed,
            },
            None => AggregatedPeriod {
                period_start: cursor,
                net_minor: 0,
                observation_count: 0,
                coverage: Coverage::NoActivity,
            },
        };
        periods.push(period);
        cursor = granularity.advance(cursor, 1);
    }

    debug!(
        "aggregated {}/{} at {}: {} periods ({} observed)",
        account_id,
        category,
        granularity,
        periods.len(),
        periods.iter().filter(|p| p.coverage == Coverage::Observed).count()
    );

    Ok(AggregatedSeries {
        account_id: account_id.clone(),
        category: category.clone(),
        granularity,
        history_start,
        periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::CurrencyCode;
    use crate::core::transaction::Transaction;
    use chrono::{TimeZone, Utc};

    fn tx(y: i32, m: u32, d: u32, amount: i64) -> Transaction {
        Transaction::new(
            AccountId::new("ACC-001"),
            Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap(),
            amount,
            Category::new("groceries"),
            CurrencyCode::new("EUR"),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run(log: &TransactionLog) -> AggregatedSeries {
        aggregate(
            log,
            &AccountId::new("ACC-001"),
            &Category::new("groceries"),
            Granularity::Monthly,
            date(2024, 1, 1),
            date(2025, 1, 1),
        )
        .unwrap()
    }

    #[test]
    fn test_basic_monthly_aggregation() {
        let log: TransactionLog = vec![
            tx(2024, 1, 5, -3000),
            tx(2024, 1, 20, -2000),
            tx(2024, 2, 3, -4000),
        ]
        .into_iter()
        .collect();

        let series = run(&log);
        assert_eq!(series.len(), 2);
        assert_eq!(series.periods[0].net_minor, -5000);
        assert_eq!(series.periods[0].observation_count, 2);
        assert_eq!(series.periods[1].net_minor, -4000);
        assert!(series.periods.iter().all(|p| p.coverage == Coverage::Observed));
    }

    #[test]
    fn test_gap_filled_with_no_activity() {
        let log: TransactionLog = vec![tx(2024, 1, 5, -3000), tx(2024, 4, 3, -4000)]
            .into_iter()
            .collect();

        let series = run(&log);
        assert_eq!(series.len(), 4);
        assert_eq!(series.periods[1].net_minor, 0);
        assert_eq!(series.periods[1].observation_count, 0);
        assert_eq!(series.periods[1].coverage, Coverage::NoActivity);
        assert_eq!(series.periods[2].coverage, Coverage::NoActivity);
        assert_eq!(series.observed_count(), 2);
    }

    #[test]
    fn test_out_of_order_input_is_sorted() {
        let ordered: TransactionLog = vec![tx(2024, 1, 5, -100), tx(2024, 2, 5, -200)]
            .into_iter()
            .collect();
        let shuffled: TransactionLog = vec![tx(2024, 2, 5, -200), tx(2024, 1, 5, -100)]
            .into_iter()
            .collect();
        assert_eq!(run(&ordered).values(), run(&shuffled).values());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let log: TransactionLog = vec![tx(2023, 12, 30, -100)].into_iter().collect();
        let result = aggregate(
            &log,
            &AccountId::new("ACC-001"),
            &Category::new("groceries"),
            Granularity::Monthly,
            date(2024, 1, 1),
            date(2025, 1, 1),
        );
        assert!(matches!(result, Err(EngineError::Range { .. })));
    }

    #[test]
    fn test_idempotent_bit_identical() {
        let log: TransactionLog = vec![
            tx(2024, 1, 5, -3000),
            tx(2024, 3, 20, -2000),
            tx(2024, 2, 3, 150_000),
        ]
        .into_iter()
        .collect();

        let first = run(&log);
        let second = run(&log);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_input_yields_empty_series() {
        let log = TransactionLog::new();
        let series = run(&log);
        assert!(series.is_empty());
    }

    #[test]
    fn test_other_accounts_and_categories_ignored() {
        let mut log = TransactionLog::new();
        log.append(tx(2024, 1, 5, -3000));
        log.append(Transaction::new(
            AccountId::new("ACC-OTHER"),
            Utc.with_ymd_and_hms(2024, 1, 6, 10, 0, 0).unwrap(),
            -9999,
            Category::new("groceries"),
            CurrencyCode::new("EUR"),
        ));
        log.append(Transaction::new(
            AccountId::new("ACC-001"),
            Utc.with_ymd_and_hms(2024, 1, 7, 10, 0, 0).unwrap(),
            -8888,
            Category::new("rent"),
            CurrencyCode::new("EUR"),
        ));

        let series = run(&log);
        assert_eq!(series.len(), 1);
        assert_eq!(series.periods[0].net_minor, -3000);
    }
}
