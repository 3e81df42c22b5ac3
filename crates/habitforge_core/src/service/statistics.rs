//! Adherence statistics over cadence periods.
//!
//! # Responsibility
//! - Walk consecutive cadence periods from a start instant up to now.
//! - Count periods containing at least one completion.
//!
//! # Invariants
//! - Periods are half-open `[start, next_start)`.
//! - A period counts once no matter how many completions it holds.
//! - Monthly periods follow calendar months from the start instant.
//! - `adherence_rate` is a percentage rounded to 2 decimals, 0 when no
//!   period has elapsed.

use crate::model::cadence::Cadence;
use crate::model::habit_log::HabitLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics payload for one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStatistics {
    pub habit_name: String,
    pub total_periods: u32,
    pub completed: u32,
    /// Percentage in `0.0..=100.0`, 2-decimal precision.
    pub adherence_rate: f64,
    #[serde(rename = "habit_frequency")]
    pub cadence: Cadence,
}

/// Raw period counts before the rate is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodTally {
    pub total_periods: u32,
    pub completed: u32,
}

impl PeriodTally {
    /// `completed / total_periods * 100`, rounded to 2 decimals.
    pub fn adherence_rate(&self) -> f64 {
        if self.total_periods == 0 {
            return 0.0;
        }
        let rate = f64::from(self.completed) / f64::from(self.total_periods) * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

/// Tallies periods from `start` while the period start is not after `now`.
pub fn tally_periods(
    cadence: Cadence,
    start: DateTime<Utc>,
    logs: &[HabitLog],
    now: DateTime<Utc>,
) -> PeriodTally {
    let mut completions = logs
        .iter()
        .filter(|log| log.is_done())
        .map(|log| log.logged_at)
        .collect::<Vec<_>>();
    completions.sort_unstable();

    let mut tally = PeriodTally::default();
    let mut index = 0_u32;
    while let Some(period_start) = cadence.period_start(start, index) {
        if period_start > now {
            break;
        }
        let period_end = index
            .checked_add(1)
            .and_then(|next| cadence.period_start(start, next));

        tally.total_periods += 1;
        let first_inside = completions.partition_point(|at| *at < period_start);
        let hit = completions
            .get(first_inside)
            .is_some_and(|at| period_end.map_or(true, |end| *at < end));
        if hit {
            tally.completed += 1;
        }

        match index.checked_add(1) {
            Some(next) => index = next,
            None => break,
        }
    }

    tally
}
