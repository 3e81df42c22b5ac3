//! Habit log repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read a habit's log history (latest entry, full ascending sequence).
//! - Append completion logs, including the guarded append used by
//!   admission.
//!
//! # Invariants
//! - Logs are append-only; no update or delete path exists here.
//! - History reads are fresh queries ordered by `logged_at`, ties broken by
//!   insertion order.
//! - `insert_log_if_idle` checks and inserts under one `IMMEDIATE`
//!   transaction, so concurrent writers for the same habit serialize.

use crate::model::habit::HabitId;
use crate::model::habit_log::HabitLog;
use crate::repo::habit_repo::{
    ensure_table, is_constraint_violation, millis_to_datetime, parse_habit_id, RepoError,
    RepoResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const LOG_SELECT_SQL: &str = "SELECT
    habit_id,
    username,
    habit_name,
    value,
    logged_at
FROM habit_logs";

/// Repository interface for habit completion logs.
pub trait HabitLogRepository {
    /// Latest log by timestamp, if any.
    fn find_most_recent_log(&self, habit_id: HabitId) -> RepoResult<Option<HabitLog>>;
    /// Full history ordered by timestamp ascending.
    fn find_logs_ascending(&self, habit_id: HabitId) -> RepoResult<Vec<HabitLog>>;
    /// Appends one log unconditionally.
    fn insert_log(&self, log: &HabitLog) -> RepoResult<HabitLog>;
    /// Appends `log` only when no log for the same habit is newer than
    /// `idle_since`. Returns `None` when a newer log already exists.
    fn insert_log_if_idle(
        &self,
        log: &HabitLog,
        idle_since: DateTime<Utc>,
    ) -> RepoResult<Option<HabitLog>>;
}

/// SQLite-backed habit log repository.
pub struct SqliteHabitLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitLogRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "habit_logs")?;
        Ok(Self { conn })
    }
}

impl HabitLogRepository for SqliteHabitLogRepository<'_> {
    fn find_most_recent_log(&self, habit_id: HabitId) -> RepoResult<Option<HabitLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LOG_SELECT_SQL}
             WHERE habit_id = ?1
             ORDER BY logged_at DESC, log_id DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([habit_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_log_row(row)?));
        }
        Ok(None)
    }

    fn find_logs_ascending(&self, habit_id: HabitId) -> RepoResult<Vec<HabitLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LOG_SELECT_SQL}
             WHERE habit_id = ?1
             ORDER BY logged_at ASC, log_id ASC;"
        ))?;
        let mut rows = stmt.query([habit_id.to_string()])?;
        let mut logs = Vec::new();
        while let Some(row) = rows.next()? {
            logs.push(parse_log_row(row)?);
        }
        Ok(logs)
    }

    fn insert_log(&self, log: &HabitLog) -> RepoResult<HabitLog> {
        let result = self.conn.execute(
            "INSERT INTO habit_logs (
                habit_id,
                username,
                habit_name,
                value,
                logged_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                log.habit_id.to_string(),
                log.username.as_str(),
                log.habit_name.as_str(),
                log.value.as_str(),
                log.logged_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(log.clone()),
            Err(err) => Err(map_insert_error(err, log.habit_id)),
        }
    }

    fn insert_log_if_idle(
        &self,
        log: &HabitLog,
        idle_since: DateTime<Utc>,
    ) -> RepoResult<Option<HabitLog>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO habit_logs (
                habit_id,
                username,
                habit_name,
                value,
                logged_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE NOT EXISTS (
                SELECT 1
                FROM habit_logs
                WHERE habit_id = ?1
                  AND logged_at > ?6
            );",
            params![
                log.habit_id.to_string(),
                log.username.as_str(),
                log.habit_name.as_str(),
                log.value.as_str(),
                log.logged_at.timestamp_millis(),
                idle_since.timestamp_millis(),
            ],
        );

        let inserted = match inserted {
            Ok(count) => count,
            Err(err) => return Err(map_insert_error(err, log.habit_id)),
        };
        tx.commit()?;

        Ok((inserted == 1).then(|| log.clone()))
    }
}

// Logs only reference habits through the foreign key, so a constraint
// failure on insert means the habit row is gone.
fn map_insert_error(err: rusqlite::Error, habit_id: HabitId) -> RepoError {
    if is_constraint_violation(&err) {
        RepoError::NotFound(habit_id)
    } else {
        err.into()
    }
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<HabitLog> {
    let id_text: String = row.get("habit_id")?;
    Ok(HabitLog {
        habit_id: parse_habit_id(&id_text, "habit_logs.habit_id")?,
        username: row.get("username")?,
        habit_name: row.get("habit_name")?,
        value: row.get("value")?,
        logged_at: millis_to_datetime(row.get("logged_at")?, "habit_logs.logged_at")?,
    })
}
