//! Viewport targeting.
//!
//! # Responsibility
//! - Turn the current focus (selection or playback event) into the map view
//!   the renderer should move to.
//!
//! # Invariants
//! - Pure: no I/O, no memory of earlier viewports. Transition animation is
//!   the renderer's concern.
//! - First applicable rule wins: location bounds, then path bounds, then
//!   focused coordinate, then home.

use crate::config::{FitPolicy, ViewportPolicy};
use crate::model::coordinate::Coordinate;
use crate::model::event::LifecycleEvent;
use crate::spatial::bounds::Bounds;
use crate::spatial::classifier::KnownLocations;
use crate::spatial::path::HighlightedPath;
use serde::{Deserialize, Serialize};

/// Desired map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewportTarget {
    Center {
        center: Coordinate,
        zoom: u8,
    },
    Fit {
        bounds: Bounds,
        padding_px: u32,
        max_zoom: u8,
    },
}

/// How a bounds rectangle is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsStyle {
    /// Zoomed into one site.
    Tight,
    /// A route between sites.
    Loose,
}

/// Classifies bounds by north-south extent.
pub fn classify_bounds(bounds: &Bounds, policy: &ViewportPolicy) -> BoundsStyle {
    if bounds.lat_span() < policy.tight_threshold_deg {
        BoundsStyle::Tight
    } else {
        BoundsStyle::Loose
    }
}

/// Fit target for `bounds` with the padding/zoom cap of its style.
pub fn fit_bounds(bounds: Bounds, policy: &ViewportPolicy) -> ViewportTarget {
    let FitPolicy {
        padding_px,
        max_zoom,
    } = match classify_bounds(&bounds, policy) {
        BoundsStyle::Tight => policy.tight,
        BoundsStyle::Loose => policy.loose,
    };
    ViewportTarget::Fit {
        bounds,
        padding_px,
        max_zoom,
    }
}

/// Fixed-area square around a non-transport event; `None` for transport.
pub fn location_bounds(event: &LifecycleEvent, policy: &ViewportPolicy) -> Option<Bounds> {
    if event.category.is_transport() {
        return None;
    }
    Some(Bounds::square_around(
        event.coordinate,
        policy.location_square_deg,
    ))
}

/// Inputs of one viewport computation.
#[derive(Debug, Clone, Copy)]
pub struct ViewportInput<'a> {
    pub home: Coordinate,
    /// Event selected by the user, if any.
    pub selected: Option<&'a LifecycleEvent>,
    /// Current playback event; takes precedence over `selected`.
    pub playback_event: Option<&'a LifecycleEvent>,
    /// Explicit bounds for the focused event.
    pub location_bounds: Option<Bounds>,
    pub highlighted_path: Option<&'a HighlightedPath>,
    pub known_locations: &'a KnownLocations,
    /// Always-shown connector paths.
    pub connector_paths: &'a [HighlightedPath],
}

impl<'a> ViewportInput<'a> {
    /// Input with nothing focused.
    pub fn home(
        home: Coordinate,
        known_locations: &'a KnownLocations,
        connector_paths: &'a [HighlightedPath],
    ) -> Self {
        Self {
            home,
            selected: None,
            playback_event: None,
            location_bounds: None,
            highlighted_path: None,
            known_locations,
            connector_paths,
        }
    }

    /// Focused event: playback wins over selection.
    pub fn focus(&self) -> Option<&'a LifecycleEvent> {
        self.playback_event.or(self.selected)
    }
}

/// Computes the map view for the current focus.
pub fn compute_viewport(input: &ViewportInput<'_>, policy: &ViewportPolicy) -> ViewportTarget {
    if let Some(bounds) = input.location_bounds {
        return fit_bounds(bounds, policy);
    }

    if let Some(path) = input.highlighted_path.filter(|_| policy.zoom_to_path) {
        let coordinates = input
            .known_locations
            .iter()
            .map(|(_, coordinate)| coordinate)
            .chain(
                input
                    .connector_paths
                    .iter()
                    .flat_map(|connector| connector.points().iter().copied()),
            )
            .chain(path.points().iter().copied());
        if let Some(bounds) = Bounds::from_coordinates(coordinates) {
            return fit_bounds(bounds, policy);
        }
    }

    match input.focus() {
        Some(event) => ViewportTarget::Center {
            center: event.coordinate,
            zoom: policy.selected_zoom,
        },
        None => ViewportTarget::Center {
            center: input.home,
            zoom: policy.home_zoom,
        },
    }
}
