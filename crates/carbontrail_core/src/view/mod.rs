//! Viewport targeting and render-ready scene output.

pub mod scene;
pub mod viewport;

pub use scene::{
    build_scene, resolve_event_icon, resolve_location_icon, IconKeys, IconResolver, MapSurface,
    MarkerKind, MarkerSpec, PolylineSpec, PolylineStyle, Popup, SceneFrame, SceneInput,
};
pub use viewport::{
    classify_bounds, compute_viewport, fit_bounds, location_bounds, BoundsStyle, ViewportInput,
    ViewportTarget,
};
