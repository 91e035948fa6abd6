//! Canonical location classification.
//!
//! # Responsibility
//! - Match an event coordinate to one of the project's canonical anchors.
//! - Resolve the coordinates actually observed at each anchor.
//! - Group events per anchor for the location timeline.
//!
//! # Invariants
//! - Matching is first-match-wins in `LocationRole` order.
//! - "No match" is a normal result; unmatched events are kept, only
//!   excluded from grouping.

use crate::model::coordinate::Coordinate;
use crate::model::event::LifecycleEvent;
use crate::model::location::{CanonicalLocations, LocationRole};
use crate::model::project::Project;

/// Result of classifying one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Matched(LocationRole),
    Unmatched,
}

impl Classification {
    pub fn role(self) -> Option<LocationRole> {
        match self {
            Self::Matched(role) => Some(role),
            Self::Unmatched => None,
        }
    }
}

/// Classifies one coordinate against the anchor set.
///
/// Anchor sets are validated as non-overlapping, so at most one anchor can
/// contain the coordinate.
pub fn classify(coordinate: Coordinate, anchors: &CanonicalLocations) -> Classification {
    anchors
        .iter()
        .find(|anchor| anchor.contains(coordinate))
        .map_or(Classification::Unmatched, |anchor| {
            Classification::Matched(anchor.role)
        })
}

/// Coordinates observed at each canonical anchor.
///
/// A role is known when at least one event was recorded at that anchor; the
/// first such event (in project order) provides the coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KnownLocations {
    coords: [Option<Coordinate>; 3],
}

impl KnownLocations {
    pub fn resolve(events: &[LifecycleEvent], anchors: &CanonicalLocations) -> Self {
        let mut coords = [None; 3];
        for event in events {
            if let Classification::Matched(role) = classify(event.coordinate, anchors) {
                coords[role.index()].get_or_insert(event.coordinate);
            }
            if coords.iter().all(Option::is_some) {
                break;
            }
        }
        Self { coords }
    }

    pub fn for_project(project: &Project) -> Self {
        Self::resolve(&project.events, project.canonical_locations())
    }

    /// Builds a set directly from per-role coordinates.
    pub fn from_parts(
        project_prep: Option<Coordinate>,
        processing: Option<Coordinate>,
        application: Option<Coordinate>,
    ) -> Self {
        Self {
            coords: [project_prep, processing, application],
        }
    }

    pub fn get(&self, role: LocationRole) -> Option<Coordinate> {
        self.coords[role.index()]
    }

    /// Known `(role, coordinate)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationRole, Coordinate)> + '_ {
        LocationRole::ALL
            .into_iter()
            .filter_map(|role| self.get(role).map(|coordinate| (role, coordinate)))
    }

    pub fn is_empty(&self) -> bool {
        self.coords.iter().all(Option::is_none)
    }
}

/// Events recorded at one canonical location.
#[derive(Debug, Clone)]
pub struct LocationGroup<'a> {
    pub role: LocationRole,
    pub label: &'a str,
    pub anchor: Coordinate,
    /// `(project index, event)` sorted by timestamp.
    pub events: Vec<(usize, &'a LifecycleEvent)>,
}

/// Events partitioned by canonical location.
#[derive(Debug, Clone)]
pub struct LocationGroups<'a> {
    /// One group per role, in role order; groups may be empty.
    pub groups: Vec<LocationGroup<'a>>,
    /// Indices of events outside every anchor, in project order.
    pub unmatched: Vec<usize>,
}

/// Groups a project's events by canonical location, sorted by time.
///
/// Sorting is stable, so events with equal timestamps keep project order.
pub fn group_by_canonical_location(project: &Project) -> LocationGroups<'_> {
    let anchors = project.canonical_locations();
    let mut groups = anchors
        .iter()
        .map(|anchor| LocationGroup {
            role: anchor.role,
            label: anchor.label.as_str(),
            anchor: anchor.coordinate,
            events: Vec::new(),
        })
        .collect::<Vec<_>>();
    let mut unmatched = Vec::new();

    for (index, event) in project.events.iter().enumerate() {
        match classify(event.coordinate, anchors) {
            Classification::Matched(role) => groups[role.index()].events.push((index, event)),
            Classification::Unmatched => unmatched.push(index),
        }
    }
    for group in &mut groups {
        group.events.sort_by_key(|(_, event)| event.timestamp);
    }

    LocationGroups { groups, unmatched }
}
