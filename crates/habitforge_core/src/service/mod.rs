//! Engine use-case services.
//!
//! # Responsibility
//! - Admission, streak and statistics rules (`admission`, `streak`,
//!   `statistics`) as pure functions over logs and instants.
//! - Orchestration over injected repositories and clock (`engine`,
//!   `habit_service`).
//!
//! # Invariants
//! - Services stay storage-agnostic; they only see repository traits.

pub mod admission;
pub mod engine;
pub mod error;
pub mod habit_service;
pub mod statistics;
pub mod streak;
