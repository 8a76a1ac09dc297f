use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The period length at which transactions are aggregated.
///
/// Period starts are canonical: daily periods start at the calendar
/// day, weekly periods on Monday, monthly periods on the 1st. Every
/// series and forecast in the engine is aligned to these starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// Floor a timestamp to the start of its containing period.
    pub fn period_start(&self, ts: DateTime<Utc>) -> NaiveDate {
        let date = ts.date_naive();
        self.floor(date)
    }

    /// Floor a date to the start of its containing period.
    pub fn floor(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                let offset = date.weekday().num_days_from_monday() as i64;
                date - Duration::days(offset)
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Advance a period start by `n` periods. `n` may be negative.
    pub fn advance(&self, start: NaiveDate, n: i64) -> NaiveDate {
        match self {
            Granularity::Daily => start + Duration::days(n),
            Granularity::Weekly => start + Duration::weeks(n),
            Granularity::Monthly => {
                let months = start.year() as i64 * 12 + start.month0() as i64 + n;
                let year = months.div_euclid(12) as i32;
                let month = months.rem_euclid(12) as u32 + 1;
                NaiveDate::from_ymd_opt(year, month, 1)
                    .unwrap_or(start)
            }
        }
    }

    /// Number of whole periods from `from` to `to` (both period starts).
    /// Negative when `to` precedes `from`.
    pub fn periods_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        match self {
            Granularity::Daily => (to - from).num_days(),
            Granularity::Weekly => (to - from).num_days() / 7,
            Granularity::Monthly => {
                (to.year() as i64 * 12 + to.month0() as i64)
                    - (from.year() as i64 * 12 + from.month0() as i64)
            }
        }
    }

    /// Length of one seasonal cycle in periods: a week of days, a year
    /// of weeks, a year of months.
    pub fn season_length(&self) -> usize {
        match self {
            Granularity::Daily => 7,
            Granularity::Weekly => 52,
            Granularity::Monthly => 12,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(format!("unknown granularity: {}", other)),
        }
    }
}
