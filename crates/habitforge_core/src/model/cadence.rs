//! Habit cadence and period arithmetic.
//!
//! # Responsibility
//! - Parse and label the three supported cadences.
//! - Own the fixed admission windows and the calendar-aware statistics
//!   period stepping.
//!
//! # Invariants
//! - Admission windows are fixed lengths: 1 day, 7 days, 30 days.
//! - Statistics periods for `Monthly` follow calendar months, so the two
//!   notions of "month" intentionally differ.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Required repetition interval for a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    /// All supported cadences in ascending period length.
    pub const ALL: [Cadence; 3] = [Cadence::Daily, Cadence::Weekly, Cadence::Monthly];

    /// Parses a cadence label case-insensitively, ignoring surrounding
    /// whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    /// Canonical lowercase label used by storage and wire formats.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Minimum time that must elapse between two admitted logs.
    pub fn min_admission_interval(self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::weeks(1),
            Self::Monthly => Duration::days(30),
        }
    }

    /// Start of the `index`-th statistics period counted from `origin`.
    ///
    /// Monthly periods are computed from the origin rather than chained, so a
    /// start on the 31st clamps per month without drifting (Jan 31, Feb 28,
    /// Mar 31, ...). Returns `None` on calendar overflow.
    pub fn period_start(self, origin: DateTime<Utc>, index: u32) -> Option<DateTime<Utc>> {
        match self {
            Self::Daily => origin.checked_add_signed(Duration::days(i64::from(index))),
            Self::Weekly => origin.checked_add_signed(Duration::weeks(i64::from(index))),
            Self::Monthly => origin.checked_add_months(Months::new(index)),
        }
    }
}

impl Display for Cadence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of ISO weeks (52 or 53) in the given ISO week-year.
pub fn iso_weeks_in_year(iso_year: i32) -> u32 {
    // Dec 28 always falls in the last ISO week of its year.
    NaiveDate::from_ymd_opt(iso_year, 12, 28)
        .map(|date| date.iso_week().week())
        .unwrap_or(52)
}
