//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record owned by one user.
//! - Resolve the stored frequency text into a typed `Cadence`.
//!
//! # Invariants
//! - `habit_id` is stable, non-nil and never reused.
//! - `(username, habit_name)` is unique; enforced by storage.
//! - `frequency` is stored as text so legacy values survive reads; engine
//!   operations reject missing or unknown values at call time.

use crate::model::cadence::Cadence;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier for a habit.
pub type HabitId = Uuid;

/// Canonical habit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub habit_id: HabitId,
    /// Owner of the habit.
    pub username: String,
    /// Human-readable name, unique per `username`.
    pub habit_name: String,
    /// Raw cadence label. `None` until the user sets one.
    pub frequency: Option<String>,
    /// Optional free-text status.
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Why a habit's cadence cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CadenceError {
    Missing,
    Invalid(String),
}

impl Display for CadenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "habit has no frequency set"),
            Self::Invalid(value) => write!(
                f,
                "frequency `{value}` is not one of daily|weekly|monthly"
            ),
        }
    }
}

impl Error for CadenceError {}

/// Structural validation failures for habit records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    NilId,
    EmptyUsername,
    EmptyHabitName,
    InvalidFrequency(String),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "habit_id must not be nil"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyHabitName => write!(f, "habit_name must not be empty"),
            Self::InvalidFrequency(value) => write!(
                f,
                "frequency `{value}` is not one of daily|weekly|monthly"
            ),
        }
    }
}

impl Error for HabitValidationError {}

impl Habit {
    /// Creates a habit with a generated id and no status.
    pub fn new(
        username: impl Into<String>,
        habit_name: impl Into<String>,
        cadence: Option<Cadence>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            habit_id: Uuid::new_v4(),
            username: username.into(),
            habit_name: habit_name.into(),
            frequency: cadence.map(|value| value.as_str().to_string()),
            status: None,
            created_at,
        }
    }

    /// Resolves the stored frequency into a typed cadence.
    pub fn cadence(&self) -> Result<Cadence, CadenceError> {
        let raw = match self.frequency.as_deref() {
            Some(value) if !value.trim().is_empty() => value,
            _ => return Err(CadenceError::Missing),
        };
        Cadence::parse(raw).ok_or_else(|| CadenceError::Invalid(raw.to_string()))
    }

    /// Checks fields every persisted habit must satisfy.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.habit_id.is_nil() {
            return Err(HabitValidationError::NilId);
        }
        if self.username.trim().is_empty() {
            return Err(HabitValidationError::EmptyUsername);
        }
        if self.habit_name.trim().is_empty() {
            return Err(HabitValidationError::EmptyHabitName);
        }
        Ok(())
    }

    /// Stricter check for write paths: a present frequency must parse.
    pub fn validate_for_write(&self) -> Result<(), HabitValidationError> {
        self.validate()?;
        match self.cadence() {
            Ok(_) | Err(CadenceError::Missing) => Ok(()),
            Err(CadenceError::Invalid(value)) => {
                Err(HabitValidationError::InvalidFrequency(value))
            }
        }
    }
}

/// Normalizes a user-supplied habit name: trims and collapses inner
/// whitespace runs to one space.
pub fn normalize_habit_name(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}
