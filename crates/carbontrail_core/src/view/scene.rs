//! Render-ready scene description.
//!
//! # Responsibility
//! - Describe what a map surface should draw: viewport, markers, polylines.
//! - Resolve marker icons through a caller-supplied resolver.
//!
//! # Invariants
//! - Icon lookups never fail; unknown categories get the default icon.
//! - Event markers are declustered before they are emitted.

use crate::config::{EngineConfig, MarkerVisibility};
use crate::model::coordinate::Coordinate;
use crate::model::event::{EventCategory, LifecycleEvent};
use crate::model::location::LocationRole;
use crate::model::project::{Methodology, Project};
use crate::spatial::classifier::{classify, KnownLocations};
use crate::spatial::decluster::decluster_events;
use crate::spatial::path::HighlightedPath;
use crate::view::viewport::ViewportTarget;
use chrono::{DateTime, Utc};

/// Icon key used when a category has no dedicated icon.
pub const DEFAULT_ICON_KEY: &str = "sensor_reading";

/// Maps categories and anchor roles to renderable icon handles.
pub trait IconResolver {
    type Icon: Clone;

    /// Icon for a lifecycle category; `None` when the resolver has none.
    fn event_icon(&self, category: EventCategory) -> Option<Self::Icon>;

    fn location_icon(&self, role: LocationRole, methodology: Methodology) -> Option<Self::Icon>;

    fn default_icon(&self) -> Self::Icon;
}

/// Event icon with default fallback.
pub fn resolve_event_icon<R: IconResolver + ?Sized>(resolver: &R, category: EventCategory) -> R::Icon {
    resolver
        .event_icon(category)
        .unwrap_or_else(|| resolver.default_icon())
}

/// Anchor icon with default fallback.
pub fn resolve_location_icon<R: IconResolver + ?Sized>(
    resolver: &R,
    role: LocationRole,
    methodology: Methodology,
) -> R::Icon {
    resolver
        .location_icon(role, methodology)
        .unwrap_or_else(|| resolver.default_icon())
}

/// Resolver that yields stable string keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct IconKeys;

impl IconResolver for IconKeys {
    type Icon = &'static str;

    fn event_icon(&self, category: EventCategory) -> Option<Self::Icon> {
        Some(category.as_str())
    }

    fn location_icon(&self, role: LocationRole, methodology: Methodology) -> Option<Self::Icon> {
        Some(role.icon_key(methodology))
    }

    fn default_icon(&self) -> Self::Icon {
        DEFAULT_ICON_KEY
    }
}

/// Drawing surface fed by a map session.
pub trait MapSurface {
    type Icon;

    fn render(&mut self, frame: &SceneFrame<Self::Icon>);
}

/// What a marker stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Location(LocationRole),
    /// Project event index.
    Event(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub description: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub location_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec<I> {
    pub kind: MarkerKind,
    pub coordinate: Coordinate,
    pub icon: I,
    pub popup: Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolylineStyle {
    /// Always-shown route between consecutive anchors.
    Connector,
    /// Transport leg of the focused event.
    Highlighted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineSpec {
    pub points: Vec<Coordinate>,
    pub style: PolylineStyle,
}

/// Everything one render pass needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame<I> {
    pub viewport: ViewportTarget,
    pub markers: Vec<MarkerSpec<I>>,
    pub polylines: Vec<PolylineSpec>,
}

impl<I> SceneFrame<I> {
    pub fn event_markers(&self) -> impl Iterator<Item = &MarkerSpec<I>> {
        self.markers
            .iter()
            .filter(|marker| matches!(marker.kind, MarkerKind::Event(_)))
    }
}

/// Inputs of one scene build.
#[derive(Debug, Clone, Copy)]
pub struct SceneInput<'a> {
    pub project: &'a Project,
    pub config: &'a EngineConfig,
    pub known_locations: &'a KnownLocations,
    pub connector_paths: &'a [HighlightedPath],
    pub focused: Option<usize>,
    pub highlighted_path: Option<&'a HighlightedPath>,
    pub viewport: ViewportTarget,
}

/// Builds the scene for the current focus.
pub fn build_scene<R: IconResolver + ?Sized>(input: &SceneInput<'_>, icons: &R) -> SceneFrame<R::Icon> {
    let project = input.project;
    let anchors = project.canonical_locations();

    let mut markers = input
        .known_locations
        .iter()
        .map(|(role, coordinate)| {
            let label = anchors.get(role).label.clone();
            MarkerSpec {
                kind: MarkerKind::Location(role),
                coordinate,
                icon: resolve_location_icon(icons, role, project.methodology),
                popup: Popup {
                    title: label.clone(),
                    description: String::new(),
                    timestamp: None,
                    location_label: Some(label),
                },
            }
        })
        .collect::<Vec<_>>();

    let shown = match input.config.markers {
        MarkerVisibility::All => project.events.iter().enumerate().collect::<Vec<_>>(),
        MarkerVisibility::SelectedOnly => input
            .focused
            .and_then(|index| project.event(index).map(|event| (index, event)))
            .into_iter()
            .collect(),
    };
    let refs = shown.iter().map(|(_, event)| *event).collect::<Vec<_>>();
    let placed = decluster_events(
        &refs,
        input.config.decluster.base_offset_deg,
        input.config.decluster.group_precision,
    );
    for ((index, event), placement) in shown.iter().zip(placed) {
        markers.push(MarkerSpec {
            kind: MarkerKind::Event(*index),
            coordinate: placement.position,
            icon: resolve_event_icon(icons, event.category),
            popup: event_popup(project, event),
        });
    }

    let mut polylines = input
        .connector_paths
        .iter()
        .map(|path| PolylineSpec {
            points: path.points().to_vec(),
            style: PolylineStyle::Connector,
        })
        .collect::<Vec<_>>();
    if let Some(path) = input.highlighted_path {
        polylines.push(PolylineSpec {
            points: path.points().to_vec(),
            style: PolylineStyle::Highlighted,
        });
    }

    SceneFrame {
        viewport: input.viewport,
        markers,
        polylines,
    }
}

fn event_popup(project: &Project, event: &LifecycleEvent) -> Popup {
    let anchors = project.canonical_locations();
    let location_label = event.location_name.clone().or_else(|| {
        classify(event.coordinate, anchors)
            .role()
            .map(|role| anchors.get(role).label.clone())
    });
    Popup {
        title: event.title.clone(),
        description: event.description.clone(),
        timestamp: Some(event.timestamp),
        location_label,
    }
}
