//! Calendar primitives: ISO date parsing, day horizons, inclusive date windows,
//! and the clock that decides what "today" is.

use std::fmt;

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Parse a `YYYY-MM-DD` string into a calendar date.
///
/// # Errors
/// Returns `BookingError::Validation` if the string is empty or not a valid
/// ISO calendar date.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BookingError::validation("date is required"));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        BookingError::validation(format!("invalid date '{trimmed}' (expected YYYY-MM-DD)"))
    })
}

/// Format a date the way the shop writes it for customers (`dd/mm/YYYY`).
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Shift a date by a signed number of days, saturating at the calendar bounds.
pub fn offset(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// The `days` consecutive dates starting at `start` (inclusive).
///
/// Finite and restartable: calling it again yields the same sequence.
pub fn horizon(start: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> + Clone {
    start.iter_days().take(days as usize)
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The symmetric window `[center - radius, center + radius]`.
    pub fn around(center: NaiveDate, radius: i64) -> Self {
        Self {
            start: offset(center, -radius),
            end: offset(center, radius),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", display_date(self.start), display_date(self.end))
    }
}

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The current date in the shop's timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_iso_date(s).unwrap()
    }

    #[test]
    fn parse_rejects_empty_and_malformed() {
        assert!(matches!(parse_iso_date(""), Err(BookingError::Validation(_))));
        assert!(matches!(parse_iso_date("10/06/2024"), Err(BookingError::Validation(_))));
        assert!(matches!(parse_iso_date("2024-02-30"), Err(BookingError::Validation(_))));
    }

    #[test]
    fn horizon_is_restartable_and_bounded() {
        let days = horizon(d("2024-06-29"), 4);
        let first: Vec<_> = days.clone().collect();
        let second: Vec<_> = days.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![d("2024-06-29"), d("2024-06-30"), d("2024-07-01"), d("2024-07-02")]);
    }

    #[test]
    fn window_around_is_inclusive() {
        let w = DateWindow::around(d("2024-06-10"), 2);
        assert!(w.contains(d("2024-06-08")));
        assert!(w.contains(d("2024-06-12")));
        assert!(!w.contains(d("2024-06-13")));
        assert_eq!(w.to_string(), "08/06/2024 to 12/06/2024");
    }
}
