//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the read/write contracts the engine consumes.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateHabit`)
//!   in addition to DB transport errors.
//! - Engine services depend on the traits only, never on SQLite types.

pub mod habit_repo;
pub mod log_repo;
