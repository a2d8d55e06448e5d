//! Date range value type
//!
//! An inclusive span of time used for filtering operations and building
//! analytics.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, LedgerResult};

/// Inclusive range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Create a range, refusing one that ends before it starts
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> LedgerResult<Self> {
        if start > end {
            return Err(LedgerError::Validation(format!(
                "Date range start {} is after end {}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering whole calendar days from `start` through `end`
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> LedgerResult<Self> {
        let end_of_day = end
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| LedgerError::Validation(format!("Invalid end date {}", end)))?;
        let start_of_day = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| LedgerError::Validation(format!("Invalid start date {}", start)))?;
        Self::new(
            Utc.from_utc_datetime(&start_of_day),
            Utc.from_utc_datetime(&end_of_day),
        )
    }

    pub fn today() -> Self {
        let today = Utc::now().date_naive();
        Self::whole_days(today, today)
    }

    pub fn this_month() -> Self {
        let today = Utc::now().date_naive();
        let first = today.with_day(1).unwrap_or(today);
        Self::whole_days(first, last_day_of_month(first))
    }

    pub fn this_year() -> Self {
        let today = Utc::now().date_naive();
        let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
        Self::whole_days(first, last)
    }

    /// The last `days` days, ending now
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::days(days.max(0)),
            end,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of whole days spanned
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    fn whole_days(start: NaiveDate, end: NaiveDate) -> Self {
        // Both dates come from the calendar, so start <= end holds
        Self::from_dates(start, end).unwrap_or(Self {
            start: Utc::now(),
            end: Utc::now(),
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}
