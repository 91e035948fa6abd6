//! Geospatial correlation engine.
//!
//! # Responsibility
//! - Classify event coordinates against canonical locations.
//! - Decluster markers sharing a coordinate.
//! - Resolve transport paths to highlight.
//!
//! # Invariants
//! - Every function here is pure and synchronous; none of them log.

pub mod bounds;
pub mod classifier;
pub mod decluster;
pub mod path;
