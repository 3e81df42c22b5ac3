//! Habit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide habit lifecycle persistence over the `habits` table.
//! - Map storage constraint failures to semantic repository errors.
//!
//! # Invariants
//! - Write paths call `Habit::validate_for_write()` before SQL mutations.
//! - Read paths reject corrupt rows (bad id, bad timestamp) instead of
//!   masking them; unknown frequency text is preserved for the engine to
//!   report.
//! - Deleting a habit removes its logs through the foreign-key cascade.

use crate::db::DbError;
use crate::model::habit::{Habit, HabitId, HabitValidationError};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const HABIT_SELECT_SQL: &str = "SELECT
    habit_id,
    username,
    habit_name,
    frequency,
    status,
    created_at
FROM habits";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for habit and habit-log persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(HabitValidationError),
    Db(DbError),
    NotFound(HabitId),
    /// `(username, habit_name)` already taken.
    DuplicateHabit {
        username: String,
        habit_name: String,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::DuplicateHabit {
                username,
                habit_name,
            } => write!(f, "habit `{habit_name}` already exists for `{username}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for habit records.
pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>>;
    fn find_habit_by_name(&self, username: &str, habit_name: &str) -> RepoResult<Option<Habit>>;
    /// Lists one user's habits sorted by name.
    fn list_habits(&self, username: &str) -> RepoResult<Vec<Habit>>;
    fn rename_habit(&self, id: HabitId, new_name: &str) -> RepoResult<()>;
    fn set_status(&self, id: HabitId, status: Option<&str>) -> RepoResult<()>;
    /// Hard-deletes a habit and, by cascade, its logs.
    fn delete_habit(&self, id: HabitId) -> RepoResult<()>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "habits")?;
        Ok(Self { conn })
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate_for_write()?;

        let result = self.conn.execute(
            "INSERT INTO habits (
                habit_id,
                username,
                habit_name,
                frequency,
                status,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                habit.habit_id.to_string(),
                habit.username.as_str(),
                habit.habit_name.as_str(),
                habit.frequency.as_deref(),
                habit.status.as_deref(),
                habit.created_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(habit.habit_id),
            Err(err) if is_constraint_violation(&err) => Err(RepoError::DuplicateHabit {
                username: habit.username.clone(),
                habit_name: habit.habit_name.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE habit_id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }
        Ok(None)
    }

    fn find_habit_by_name(&self, username: &str, habit_name: &str) -> RepoResult<Option<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL} WHERE username = ?1 AND habit_name = ?2;"
        ))?;
        let mut rows = stmt.query(params![username, habit_name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }
        Ok(None)
    }

    fn list_habits(&self, username: &str) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL} WHERE username = ?1 ORDER BY habit_name ASC, habit_id ASC;"
        ))?;
        let mut rows = stmt.query([username])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn rename_habit(&self, id: HabitId, new_name: &str) -> RepoResult<()> {
        if new_name.trim().is_empty() {
            return Err(HabitValidationError::EmptyHabitName.into());
        }

        let result = self.conn.execute(
            "UPDATE habits SET habit_name = ?1 WHERE habit_id = ?2;",
            params![new_name, id.to_string()],
        );

        match result {
            Ok(0) => Err(RepoError::NotFound(id)),
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => {
                let username = self
                    .get_habit(id)?
                    .map(|habit| habit.username)
                    .unwrap_or_default();
                Err(RepoError::DuplicateHabit {
                    username,
                    habit_name: new_name.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn set_status(&self, id: HabitId, status: Option<&str>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE habits SET status = ?1 WHERE habit_id = ?2;",
            params![status, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE habit_id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let id_text: String = row.get("habit_id")?;
    let habit_id = parse_habit_id(&id_text, "habits.habit_id")?;
    let created_at = millis_to_datetime(row.get("created_at")?, "habits.created_at")?;

    let habit = Habit {
        habit_id,
        username: row.get("username")?,
        habit_name: row.get("habit_name")?,
        frequency: row.get("frequency")?,
        status: row.get("status")?,
        created_at,
    };
    habit.validate()?;
    Ok(habit)
}

pub(crate) fn parse_habit_id(value: &str, column: &str) -> RepoResult<HabitId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn millis_to_datetime(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(value).single().ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}"))
    })
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

pub(crate) fn ensure_table(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(table));
    }
    Ok(())
}
