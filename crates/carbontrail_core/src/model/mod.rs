//! Domain model for project lifecycle maps.
//!
//! # Responsibility
//! - Define the data types shared by the spatial engine, playback and
//!   project providers.
//! - Validate wire input so that only well-formed projects reach the engine.
//!
//! # Invariants
//! - Projects own their events exclusively; events are immutable after load.
//! - Coordinates are copied by value everywhere.

pub mod coordinate;
pub mod event;
pub mod location;
pub mod project;
