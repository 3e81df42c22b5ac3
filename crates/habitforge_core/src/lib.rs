//! Core domain logic for HabitForge.
//! This crate owns habit admission, streak and adherence rules.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::cadence::Cadence;
pub use model::habit::{CadenceError, Habit, HabitId, HabitValidationError};
pub use model::habit_log::{HabitLog, DONE_LOG_VALUE};
pub use repo::habit_repo::{HabitRepository, RepoError, RepoResult, SqliteHabitRepository};
pub use repo::log_repo::{HabitLogRepository, SqliteHabitLogRepository};
pub use service::engine::HabitEngine;
pub use service::error::{EngineError, EngineResult, ValidationError};
pub use service::habit_service::{CreateHabitRequest, HabitService};
pub use service::statistics::HabitStatistics;
pub use service::streak::HabitStreak;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
