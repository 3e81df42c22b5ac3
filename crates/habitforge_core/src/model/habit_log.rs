//! Habit completion log model.
//!
//! # Invariants
//! - Logs are immutable once written.
//! - Admission only ever writes `DONE_LOG_VALUE`; other stored values are
//!   tolerated on read and ignored by progress calculations.

use crate::model::habit::{Habit, HabitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only value accepted for a completion log.
pub const DONE_LOG_VALUE: &str = "done";

/// One completion entry for a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitLog {
    pub habit_id: HabitId,
    pub username: String,
    /// Habit name at the time of logging.
    pub habit_name: String,
    #[serde(rename = "log")]
    pub value: String,
    /// Creation instant, millisecond precision.
    #[serde(rename = "timestamp")]
    pub logged_at: DateTime<Utc>,
}

impl HabitLog {
    /// Builds a `"done"` log for `habit` stamped at `logged_at`.
    pub fn done(habit: &Habit, logged_at: DateTime<Utc>) -> Self {
        Self {
            habit_id: habit.habit_id,
            username: habit.username.clone(),
            habit_name: habit.habit_name.clone(),
            value: DONE_LOG_VALUE.to_string(),
            logged_at,
        }
    }

    /// Whether this entry counts as a completion.
    pub fn is_done(&self) -> bool {
        self.value == DONE_LOG_VALUE
    }
}
