//! Billing period types
//!
//! A billing period is a half-open calendar interval `[start, end)`. The
//! generator keys billings on the period start date, which is what the
//! store-level uniqueness constraint indexes.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must be before end {end}")]
    InvalidPeriod { start: String, end: String },

    #[error("Invalid calendar date")]
    InvalidDate,
}

/// A half-open billing period `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// First day of the period (inclusive)
    pub start: NaiveDate,
    /// First day after the period (exclusive)
    pub end: NaiveDate,
}

impl BillingPeriod {
    /// Creates a period from explicit bounds
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start >= end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Returns the calendar month containing the given date
    pub fn month_of(date: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .expect("first of month is always valid");
        let end = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        }
        .expect("first of month is always valid");
        Self { start, end }
    }

    /// Returns the current calendar month (UTC)
    pub fn current() -> Self {
        Self::month_of(Utc::now().date_naive())
    }

    /// Returns true if the date falls inside the period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Returns true if the period has fully elapsed as of the given date
    pub fn has_ended_by(&self, date: NaiveDate) -> bool {
        date >= self.end
    }

    /// Number of days covered by the period
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// A short label for logs and summaries, e.g. "2026-08"
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }

    /// Period start as a UTC timestamp (midnight)
    pub fn start_datetime(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_hms_opt(0, 0, 0).expect("midnight is valid"))
    }
}

/// Adds a whole number of days to a date; used for invoice due dates
pub fn days_after(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_of_mid_month() {
        let period = BillingPeriod::month_of(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap());
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        assert_eq!(period.label(), "2026-08");
        assert_eq!(period.days(), 31);
    }

    #[test]
    fn test_month_of_december_wraps_year() {
        let period = BillingPeriod::month_of(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_contains_is_half_open() {
        let period = BillingPeriod::month_of(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert!(period.contains(period.start));
        assert!(!period.contains(period.end));
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        let start = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let result = BillingPeriod::new(start, start);
        assert!(matches!(result, Err(TemporalError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_has_ended_by() {
        let period = BillingPeriod::month_of(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
        assert!(period.has_ended_by(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()));
        assert!(!period.has_ended_by(NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()));
    }

    #[test]
    fn test_days_after() {
        let issued = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        assert_eq!(
            days_after(issued, 15),
            NaiveDate::from_ymd_opt(2026, 9, 4).unwrap()
        );
    }
}
