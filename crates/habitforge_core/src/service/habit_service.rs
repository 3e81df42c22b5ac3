//! Habit lifecycle use-case service.
//!
//! # Responsibility
//! - Create, look up, rename, re-status and delete habits on behalf of one
//!   user.
//! - Normalize user input before it reaches the repository.
//!
//! # Invariants
//! - Habit names are trimmed and inner whitespace collapsed.
//! - New habits store a canonical lowercase frequency or none.
//! - Deletion cascades to logs through storage, not through this service.

use crate::clock::Clock;
use crate::model::cadence::Cadence;
use crate::model::habit::{normalize_habit_name, Habit, HabitId};
use crate::repo::habit_repo::HabitRepository;
use crate::service::error::{EngineError, EngineResult, ValidationError};
use log::info;

/// Input for creating a habit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateHabitRequest {
    pub username: String,
    pub habit_name: String,
    /// `daily|weekly|monthly`, any case. Blank means unset.
    pub frequency: Option<String>,
    pub status: Option<String>,
}

/// Use-case service for habit records.
pub struct HabitService<H: HabitRepository, C: Clock> {
    repo: H,
    clock: C,
}

impl<H: HabitRepository, C: Clock> HabitService<H, C> {
    pub fn new(repo: H, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates a habit; `(username, habit_name)` must be unused.
    pub fn create_habit(&self, request: &CreateHabitRequest) -> EngineResult<Habit> {
        let username = normalize_username(&request.username)?;
        let habit_name = normalize_name(&request.habit_name)?;
        let cadence = match request.frequency.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Cadence::parse(raw)
                    .ok_or_else(|| ValidationError::InvalidCadence(raw.to_string()))?,
            ),
        };

        let mut habit = Habit::new(username, habit_name, cadence, self.clock.now());
        habit.status = request
            .status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty())
            .map(str::to_string);

        let habit_id = self.repo.create_habit(&habit)?;
        info!(
            "event=habit_create module=habit_service status=ok habit_id={habit_id} cadence={}",
            cadence.map_or("none", Cadence::as_str)
        );
        Ok(habit)
    }

    /// Gets one habit by id.
    pub fn get_habit(&self, habit_id: HabitId) -> EngineResult<Habit> {
        self.repo
            .get_habit(habit_id)?
            .ok_or(EngineError::NotFound(habit_id))
    }

    /// Looks up a habit by owner and name.
    pub fn find_habit_by_name(
        &self,
        username: &str,
        habit_name: &str,
    ) -> EngineResult<Option<Habit>> {
        Ok(self
            .repo
            .find_habit_by_name(username.trim(), &normalize_habit_name(habit_name))?)
    }

    /// Lists a user's habits sorted by name.
    pub fn list_habits(&self, username: &str) -> EngineResult<Vec<Habit>> {
        Ok(self.repo.list_habits(username.trim())?)
    }

    /// Renames a habit. Existing logs keep the name they were written with.
    pub fn rename_habit(
        &self,
        username: &str,
        habit_name: &str,
        new_name: &str,
    ) -> EngineResult<Habit> {
        let habit = self.require_by_name(username, habit_name)?;
        let new_name = normalize_name(new_name)?;
        self.repo.rename_habit(habit.habit_id, &new_name)?;
        info!(
            "event=habit_rename module=habit_service status=ok habit_id={}",
            habit.habit_id
        );
        Ok(Habit {
            habit_name: new_name,
            ..habit
        })
    }

    /// Deletes a habit and, through storage cascade, its logs.
    pub fn delete_habit(&self, username: &str, habit_name: &str) -> EngineResult<HabitId> {
        let habit = self.require_by_name(username, habit_name)?;
        self.repo.delete_habit(habit.habit_id)?;
        info!(
            "event=habit_delete module=habit_service status=ok habit_id={}",
            habit.habit_id
        );
        Ok(habit.habit_id)
    }

    /// Current free-text status, if any.
    pub fn get_status(&self, username: &str, habit_name: &str) -> EngineResult<Option<String>> {
        Ok(self.require_by_name(username, habit_name)?.status)
    }

    /// Replaces the free-text status. Blank clears it.
    pub fn set_status(
        &self,
        username: &str,
        habit_name: &str,
        status: Option<&str>,
    ) -> EngineResult<()> {
        let habit = self.require_by_name(username, habit_name)?;
        let status = status.map(str::trim).filter(|value| !value.is_empty());
        self.repo.set_status(habit.habit_id, status)?;
        Ok(())
    }

    /// Stored frequency label, if any.
    pub fn habit_frequency(
        &self,
        username: &str,
        habit_name: &str,
    ) -> EngineResult<Option<String>> {
        Ok(self.require_by_name(username, habit_name)?.frequency)
    }

    /// Like `find_habit_by_name`, but a missing habit is an error.
    pub fn require_by_name(&self, username: &str, habit_name: &str) -> EngineResult<Habit> {
        self.find_habit_by_name(username, habit_name)?
            .ok_or_else(|| EngineError::HabitNameNotFound {
                username: username.trim().to_string(),
                habit_name: normalize_habit_name(habit_name),
            })
    }
}

fn normalize_username(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    Ok(trimmed.to_string())
}

fn normalize_name(value: &str) -> Result<String, ValidationError> {
    let normalized = normalize_habit_name(value);
    if normalized.is_empty() {
        return Err(ValidationError::EmptyHabitName);
    }
    Ok(normalized)
}
