//! Log admission rules.
//!
//! # Responsibility
//! - Normalize and validate a proposed log value.
//! - Decide whether the cadence's minimum interval has elapsed since the
//!   latest log.
//!
//! # Invariants
//! - Only `"done"` (case-insensitive, surrounding whitespace ignored) is
//!   admissible.
//! - Admission windows are fixed lengths (`Cadence::min_admission_interval`).
//!   `Monthly` uses 30 days here, not calendar months.
//! - `check_interval` and `idle_since` describe the same boundary: a log is
//!   admissible iff no existing log is newer than `idle_since(now)`.

use crate::model::cadence::Cadence;
use crate::model::habit_log::DONE_LOG_VALUE;
use crate::service::error::{EngineError, EngineResult, ValidationError};
use chrono::{DateTime, Utc};

/// Validates a proposed log value and returns its canonical form.
pub fn normalize_log_value(value: &str) -> Result<&'static str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyLogValue);
    }
    if trimmed.eq_ignore_ascii_case(DONE_LOG_VALUE) {
        Ok(DONE_LOG_VALUE)
    } else {
        Err(ValidationError::InvalidLogValue(trimmed.to_string()))
    }
}

/// Rejects a new log when the latest one is younger than the cadence's
/// minimum interval.
pub fn check_interval(
    cadence: Cadence,
    last_logged_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    let Some(last_logged_at) = last_logged_at else {
        return Ok(());
    };

    let min_interval = cadence.min_admission_interval();
    if now.signed_duration_since(last_logged_at) >= min_interval {
        Ok(())
    } else {
        Err(EngineError::RateLimited {
            cadence,
            min_interval,
        })
    }
}

/// Latest timestamp an existing log may carry for a log at `now` to be
/// admissible.
pub fn idle_since(cadence: Cadence, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_signed(cadence.min_admission_interval())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
