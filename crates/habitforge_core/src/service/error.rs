//! Engine error taxonomy.
//!
//! Callers map these kinds to their own transport (status codes, messages);
//! the engine makes no assumption about that mapping.

use crate::model::cadence::Cadence;
use crate::model::habit::{CadenceError, HabitId, HabitValidationError};
use crate::repo::habit_repo::RepoError;
use chrono::Duration;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;

/// Locally detectable input problems. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyLogValue,
    InvalidLogValue(String),
    MissingCadence,
    InvalidCadence(String),
    /// Statistics need at least one log to anchor the first period.
    MissingStartDate,
    EmptyUsername,
    EmptyHabitName,
    DuplicateHabit {
        username: String,
        habit_name: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLogValue => write!(f, "log content cannot be empty"),
            Self::InvalidLogValue(value) => {
                write!(f, "log content should be 'done', got `{value}`")
            }
            Self::MissingCadence => write!(
                f,
                "no frequency found; set a frequency for the habit and try again"
            ),
            Self::InvalidCadence(value) => write!(
                f,
                "frequency must be 'daily', 'weekly', or 'monthly', got `{value}`"
            ),
            Self::MissingStartDate => write!(f, "habit start date is missing"),
            Self::EmptyUsername => write!(f, "username cannot be empty"),
            Self::EmptyHabitName => write!(f, "habit name cannot be empty"),
            Self::DuplicateHabit {
                username,
                habit_name,
            } => write!(f, "habit `{habit_name}` already exists for `{username}`"),
        }
    }
}

impl Error for ValidationError {}

impl From<CadenceError> for ValidationError {
    fn from(value: CadenceError) -> Self {
        match value {
            CadenceError::Missing => Self::MissingCadence,
            CadenceError::Invalid(raw) => Self::InvalidCadence(raw),
        }
    }
}

/// Error returned by every engine operation.
#[derive(Debug)]
pub enum EngineError {
    Validation(ValidationError),
    /// Habit id does not resolve to a habit.
    NotFound(HabitId),
    /// Habit addressed by `(username, habit_name)` does not exist.
    HabitNameNotFound {
        username: String,
        habit_name: String,
    },
    /// A log was admitted too recently for this cadence.
    RateLimited {
        cadence: Cadence,
        min_interval: Duration,
    },
    /// Repository failure. Not retried by the engine.
    Store(RepoError),
}

impl EngineError {
    /// Stable machine-readable kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) | Self::HabitNameNotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::Store(_) => "store",
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::HabitNameNotFound {
                username,
                habit_name,
            } => write!(f, "habit `{habit_name}` not found for `{username}`"),
            Self::RateLimited {
                cadence,
                min_interval,
            } => write!(
                f,
                "you can't log more than 1 '{cadence}' log per {} day(s)",
                min_interval.num_days()
            ),
            Self::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CadenceError> for EngineError {
    fn from(value: CadenceError) -> Self {
        Self::Validation(value.into())
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateHabit {
                username,
                habit_name,
            } => Self::Validation(ValidationError::DuplicateHabit {
                username,
                habit_name,
            }),
            RepoError::Validation(HabitValidationError::EmptyUsername) => {
                Self::Validation(ValidationError::EmptyUsername)
            }
            RepoError::Validation(HabitValidationError::EmptyHabitName) => {
                Self::Validation(ValidationError::EmptyHabitName)
            }
            RepoError::Validation(HabitValidationError::InvalidFrequency(raw)) => {
                Self::Validation(ValidationError::InvalidCadence(raw))
            }
            other => Self::Store(other),
        }
    }
}
