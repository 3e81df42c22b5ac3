//! Streak calculation over an ascending log history.
//!
//! # Invariants
//! - Only `"done"` logs participate; other values are skipped without
//!   breaking the chain.
//! - The scan starts at the oldest completion and stops at the first
//!   non-consecutive one. The result is the length of the earliest unbroken
//!   run, not the most recent one.
//! - Daily continuity compares raw timestamps: the gap must be exactly one
//!   day.

use crate::model::cadence::{iso_weeks_in_year, Cadence};
use crate::model::habit_log::HabitLog;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Streak summary with the habit it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStreak {
    pub habit_name: String,
    pub cadence: Cadence,
    pub streak_count: u32,
}

/// Period a completion falls into, at the granularity of its cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodMarker {
    Instant(DateTime<Utc>),
    IsoWeek { year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl PeriodMarker {
    fn of(cadence: Cadence, at: DateTime<Utc>) -> Self {
        match cadence {
            Cadence::Daily => Self::Instant(at),
            Cadence::Weekly => {
                let iso = at.iso_week();
                Self::IsoWeek {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            Cadence::Monthly => Self::Month {
                year: at.year(),
                month: at.month(),
            },
        }
    }

    /// Whether `self` is exactly the unit after `previous`.
    fn follows(self, previous: Self) -> bool {
        match (previous, self) {
            (Self::Instant(prev), Self::Instant(current)) => {
                current.signed_duration_since(prev) == Duration::days(1)
            }
            (
                Self::IsoWeek {
                    year: prev_year,
                    week: prev_week,
                },
                Self::IsoWeek { year, week },
            ) => {
                (year == prev_year && week == prev_week + 1)
                    || (week == 1
                        && year == prev_year + 1
                        && prev_week == iso_weeks_in_year(prev_year))
            }
            (
                Self::Month {
                    year: prev_year,
                    month: prev_month,
                },
                Self::Month { year, month },
            ) => {
                (year == prev_year && month == prev_month + 1)
                    || (prev_month == 12 && month == 1 && year == prev_year + 1)
            }
            _ => false,
        }
    }
}

/// Counts the earliest unbroken run of completions in `logs`.
///
/// `logs` must be sorted by `logged_at` ascending.
pub fn streak_from_logs<'a>(
    cadence: Cadence,
    logs: impl IntoIterator<Item = &'a HabitLog>,
) -> u32 {
    let mut streak = 0;
    let mut last: Option<PeriodMarker> = None;

    for log in logs.into_iter().filter(|log| log.is_done()) {
        let marker = PeriodMarker::of(cadence, log.logged_at);
        if let Some(previous) = last {
            if !marker.follows(previous) {
                break;
            }
        }
        streak += 1;
        last = Some(marker);
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::streak_from_logs;
    use crate::model::cadence::Cadence;
    use crate::model::habit_log::HabitLog;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn log_at(at: DateTime<Utc>, value: &str) -> HabitLog {
        HabitLog {
            habit_id: Uuid::nil(),
            username: "ana".to_string(),
            habit_name: "read".to_string(),
            value: value.to_string(),
            logged_at: at,
        }
    }

    fn done_at(at: DateTime<Utc>) -> HabitLog {
        log_at(at, "done")
    }

    #[test]
    fn empty_history_has_zero_streak() {
        assert_eq!(streak_from_logs(Cadence::Daily, &Vec::<HabitLog>::new()), 0);
    }

    #[test]
    fn daily_requires_exact_one_day_gap() {
        let day1 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let logs = vec![
            done_at(day1),
            done_at(day1 + Duration::days(1)),
            done_at(day1 + Duration::days(2) + Duration::minutes(1)),
        ];
        assert_eq!(streak_from_logs(Cadence::Daily, &logs), 2);
    }

    #[test]
    fn non_done_values_are_skipped_without_breaking() {
        let day1 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let logs = vec![
            done_at(day1),
            log_at(day1 + Duration::hours(3), "skipped"),
            done_at(day1 + Duration::days(1)),
        ];
        assert_eq!(streak_from_logs(Cadence::Daily, &logs), 2);
    }

    #[test]
    fn weekly_wraps_only_from_last_iso_week() {
        // 2023 has 52 ISO weeks; 2020 has 53.
        let week_52 = Utc.with_ymd_and_hms(2023, 12, 27, 9, 0, 0).unwrap();
        let week_1 = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
        assert_eq!(
            streak_from_logs(Cadence::Weekly, &[done_at(week_52), done_at(week_1)]),
            2
        );

        let week_52_of_53 = Utc.with_ymd_and_hms(2020, 12, 23, 9, 0, 0).unwrap();
        let week_1_2021 = Utc.with_ymd_and_hms(2021, 1, 6, 9, 0, 0).unwrap();
        assert_eq!(
            streak_from_logs(
                Cadence::Weekly,
                &[done_at(week_52_of_53), done_at(week_1_2021)]
            ),
            1
        );
    }

    #[test]
    fn weekly_same_week_breaks_streak() {
        let monday = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        let logs = vec![done_at(monday), done_at(monday + Duration::days(2))];
        assert_eq!(streak_from_logs(Cadence::Weekly, &logs), 1);
    }

    #[test]
    fn monthly_wraps_december_to_january() {
        let logs = vec![
            done_at(Utc.with_ymd_and_hms(2023, 11, 15, 9, 0, 0).unwrap()),
            done_at(Utc.with_ymd_and_hms(2023, 12, 15, 9, 0, 0).unwrap()),
            done_at(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()),
            done_at(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()),
        ];
        assert_eq!(streak_from_logs(Cadence::Monthly, &logs), 3);
    }
}
