//! Geospatial correlation, viewport and playback engine for carbon-removal
//! project timelines.
//! This crate is the single source of truth for business invariants.

pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod playback;
pub mod repo;
pub mod service;
pub mod spatial;
pub mod view;

pub use catalog::{CatalogError, CatalogResult, InMemoryProjectCatalog, ProjectProvider};
pub use config::{
    ConfigError, DeclusterPolicy, EngineConfig, FitPolicy, MarkerVisibility, PlaybackDefaults,
    ViewportPolicy,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, level_from_env, logging_status};
pub use model::coordinate::Coordinate;
pub use model::event::{EventCategory, EventValidationError, LifecycleEvent};
pub use model::location::{CanonicalLocation, CanonicalLocations, LocationConfigError, LocationRole};
pub use model::project::{Methodology, Project, ProjectValidationError};
pub use playback::{
    Clock, ManualClock, ObserverId, PlaybackController, PlaybackError, PlaybackNotice,
    PlaybackPhase, PlaybackSpeed, SystemClock,
};
pub use repo::project_repo::{RepoError, RepoResult, SqliteProjectRepository};
pub use service::map_session::{MapSession, SessionNotice, SessionObserver};
pub use service::selection::{
    SelectionController, SelectionError, SelectionNotice, SelectionOwner, SelectionState,
};
pub use spatial::bounds::Bounds;
pub use spatial::classifier::{
    classify, group_by_canonical_location, Classification, KnownLocations,
};
pub use spatial::decluster::{decluster_events, decluster_group};
pub use spatial::path::{connector_paths, resolve_highlighted_path, HighlightedPath};
pub use view::scene::{IconKeys, IconResolver, MapSurface, SceneFrame};
pub use view::viewport::{compute_viewport, ViewportInput, ViewportTarget};

/// Minimal health-check API for linkage checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
