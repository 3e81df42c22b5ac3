//! Domain model for habits and their completion logs.
//!
//! # Responsibility
//! - Define fixed-shape records consumed by repositories and services.
//! - Keep cadence parsing and period arithmetic next to the data it reads.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - Logs reference exactly one habit and are never mutated.

pub mod cadence;
pub mod habit;
pub mod habit_log;
