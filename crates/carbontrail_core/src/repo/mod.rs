//! Repository layer over the SQLite project store.
//!
//! # Responsibility
//! - Keep SQL details behind use-case oriented project APIs.
//!
//! # Invariants
//! - Writes enforce `Project::validate()` before persistence.

pub mod project_repo;
