//! Habit progress engine.
//!
//! # Responsibility
//! - Resolve habits and their log history through injected repositories.
//! - Run admission, streak and statistics rules against the injected clock.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - Reads never write.
//! - Admission performs exactly one guarded write; the guard re-checks the
//!   cadence window inside the write, so concurrent callers cannot both
//!   insert within one window.
//! - Repository errors propagate unchanged in kind; nothing is retried.

use crate::clock::{truncate_to_millis, Clock};
use crate::model::cadence::Cadence;
use crate::model::habit::{CadenceError, Habit, HabitId};
use crate::model::habit_log::HabitLog;
use crate::repo::habit_repo::HabitRepository;
use crate::repo::log_repo::HabitLogRepository;
use crate::service::admission::{check_interval, idle_since, normalize_log_value};
use crate::service::error::{EngineError, EngineResult, ValidationError};
use crate::service::statistics::{tally_periods, HabitStatistics};
use crate::service::streak::{streak_from_logs, HabitStreak};
use log::{debug, info, warn};

/// Entry point for log admission and progress reads.
pub struct HabitEngine<H, L, C> {
    habits: H,
    logs: L,
    clock: C,
}

impl<H, L, C> HabitEngine<H, L, C>
where
    H: HabitRepository,
    L: HabitLogRepository,
    C: Clock,
{
    pub fn new(habits: H, logs: L, clock: C) -> Self {
        Self {
            habits,
            logs,
            clock,
        }
    }

    /// Admits a completion log for `habit_id`.
    ///
    /// # Errors
    /// - `Validation` for a value other than `"done"` or a missing/unknown
    ///   cadence.
    /// - `NotFound` when the habit does not exist or disappears before the
    ///   write.
    /// - `RateLimited` when the cadence window has not elapsed, including
    ///   when a concurrent caller wins the window.
    /// - `Store` for repository failures.
    pub fn admit_log(&self, habit_id: HabitId, proposed_value: &str) -> EngineResult<HabitLog> {
        let result = self.admit_log_inner(habit_id, proposed_value);
        match &result {
            Ok(_) => info!("event=log_admit module=engine status=ok habit_id={habit_id}"),
            Err(EngineError::RateLimited { cadence, .. }) => info!(
                "event=log_admit module=engine status=rejected habit_id={habit_id} reason=rate_limited cadence={cadence}"
            ),
            Err(err) => warn!(
                "event=log_admit module=engine status=error habit_id={habit_id} error_kind={}",
                err.kind()
            ),
        }
        result
    }

    fn admit_log_inner(&self, habit_id: HabitId, proposed_value: &str) -> EngineResult<HabitLog> {
        normalize_log_value(proposed_value)?;
        let habit = self.resolve_habit(habit_id)?;
        let cadence = habit.cadence()?;

        let now = truncate_to_millis(self.clock.now());
        let last = self.logs.find_most_recent_log(habit_id)?;
        check_interval(cadence, last.as_ref().map(|log| log.logged_at), now)?;

        let log = HabitLog::done(&habit, now);
        self.logs
            .insert_log_if_idle(&log, idle_since(cadence, now))?
            .ok_or(EngineError::RateLimited {
                cadence,
                min_interval: cadence.min_admission_interval(),
            })
    }

    /// Counts the earliest unbroken run of completions.
    ///
    /// A habit without a usable cadence has no streak: the result is 0 and a
    /// warning is logged. Use [`Self::streak_report`] to get the
    /// `Validation` error instead.
    ///
    /// # Errors
    /// - `NotFound` when the habit does not exist.
    pub fn compute_streak(&self, habit_id: HabitId) -> EngineResult<u32> {
        let habit = self.resolve_habit(habit_id)?;
        match habit.cadence() {
            Ok(cadence) => self.streak_for(habit_id, cadence),
            Err(err) => {
                let reason = match err {
                    CadenceError::Missing => "missing_cadence",
                    CadenceError::Invalid(_) => "invalid_cadence",
                };
                warn!(
                    "event=streak_compute module=engine status=skipped habit_id={habit_id} reason={reason}"
                );
                Ok(0)
            }
        }
    }

    /// Streak count together with the habit's name and cadence.
    ///
    /// # Errors
    /// - `NotFound` when the habit does not exist.
    /// - `Validation` when the cadence is missing or unknown.
    pub fn streak_report(&self, habit_id: HabitId) -> EngineResult<HabitStreak> {
        let habit = self.resolve_habit(habit_id)?;
        let cadence = habit.cadence()?;
        let streak_count = self.streak_for(habit_id, cadence)?;
        Ok(HabitStreak {
            habit_name: habit.habit_name,
            cadence,
            streak_count,
        })
    }

    fn streak_for(&self, habit_id: HabitId, cadence: Cadence) -> EngineResult<u32> {
        let logs = self.sorted_history(habit_id)?;
        let streak_count = streak_from_logs(cadence, &logs);
        debug!(
            "event=streak_compute module=engine status=ok habit_id={habit_id} cadence={cadence} log_count={} streak={streak_count}",
            logs.len()
        );
        Ok(streak_count)
    }

    /// Computes period adherence from the most recent log up to now.
    ///
    /// # Errors
    /// - `NotFound` when the habit does not exist.
    /// - `Validation` for a missing/unknown cadence or when no log exists to
    ///   anchor the first period.
    pub fn compute_statistics(&self, habit_id: HabitId) -> EngineResult<HabitStatistics> {
        let habit = self.resolve_habit(habit_id)?;
        let cadence = habit.cadence()?;
        let start = self
            .logs
            .find_most_recent_log(habit_id)?
            .map(|log| log.logged_at)
            .ok_or(ValidationError::MissingStartDate)?;

        let logs = self.sorted_history(habit_id)?;
        let tally = tally_periods(cadence, start, &logs, self.clock.now());

        debug!(
            "event=stats_compute module=engine status=ok habit_id={habit_id} cadence={cadence} total_periods={} completed={}",
            tally.total_periods, tally.completed
        );
        Ok(HabitStatistics {
            habit_name: habit.habit_name,
            total_periods: tally.total_periods,
            completed: tally.completed,
            adherence_rate: tally.adherence_rate(),
            cadence,
        })
    }

    /// Full log history ascending by timestamp.
    pub fn log_history(&self, habit_id: HabitId) -> EngineResult<Vec<HabitLog>> {
        self.resolve_habit(habit_id)?;
        self.sorted_history(habit_id)
    }

    fn resolve_habit(&self, habit_id: HabitId) -> EngineResult<Habit> {
        self.habits
            .get_habit(habit_id)?
            .ok_or(EngineError::NotFound(habit_id))
    }

    fn sorted_history(&self, habit_id: HabitId) -> EngineResult<Vec<HabitLog>> {
        let mut logs = self.logs.find_logs_ascending(habit_id)?;
        // Stable: equal timestamps keep storage order.
        logs.sort_by_key(|log| log.logged_at);
        Ok(logs)
    }
}
