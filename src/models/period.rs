//! Budget period representation
//!
//! A budget period is a closed date range. Helpers cover the common
//! calendar-month case.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed date range a budget applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetPeriod {
    /// First day of the period (inclusive)
    pub start: NaiveDate,
    /// Last day of the period (inclusive)
    pub end: NaiveDate,
}

impl BudgetPeriod {
    /// Create a period from explicit start/end dates
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Create a period covering one calendar month
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next_month - Duration::days(1),
        })
    }

    /// The calendar month containing today
    pub fn current_month() -> Self {
        let today = chrono::Utc::now().date_naive();
        // from_ymd_opt cannot fail for a date chrono itself produced
        Self::month(today.year(), today.month())
            .unwrap_or(Self::new(today, today))
    }

    /// Check if a date falls within this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days in the period
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Check the range is well-formed (start not after end)
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_period() {
        let period = BudgetPeriod::month(2026, 1).unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(period.days(), 31);
    }

    #[test]
    fn test_december_rollover() {
        let period = BudgetPeriod::month(2025, 12).unwrap();
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_february_leap_year() {
        let period = BudgetPeriod::month(2024, 2).unwrap();
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_contains() {
        let period = BudgetPeriod::month(2026, 1).unwrap();
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
    }

    #[test]
    fn test_validity() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert!(BudgetPeriod::new(start, end).is_valid());
        assert!(!BudgetPeriod::new(end, start).is_valid());
    }

    #[test]
    fn test_display() {
        let period = BudgetPeriod::month(2026, 1).unwrap();
        assert_eq!(format!("{}", period), "2026-01-01 to 2026-01-31");
    }
}
