//! Core use-case services.
//!
//! # Responsibility
//! - Hold the interactive state (selection, playback) for one project.
//! - Keep rendering layers decoupled from engine internals.

pub mod map_session;
pub mod selection;
