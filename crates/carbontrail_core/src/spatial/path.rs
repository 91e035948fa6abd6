//! Transport path resolution.
//!
//! # Responsibility
//! - Map transport event categories to origin/destination location roles,
//!   per methodology.
//! - Build the highlighted path for an event and the always-shown connector
//!   paths between canonical locations.
//!
//! # Invariants
//! - Each methodology has its own table; there is no cross-methodology
//!   fallback.
//! - A path is only produced when both endpoint roles are known.

use super::classifier::KnownLocations;
use crate::model::coordinate::Coordinate;
use crate::model::event::{EventCategory, LifecycleEvent};
use crate::model::location::LocationRole;
use crate::model::project::Methodology;

/// Ordered sequence of at least two coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedPath {
    points: Vec<Coordinate>,
}

impl HighlightedPath {
    /// Returns `None` for fewer than two points.
    pub fn new(points: Vec<Coordinate>) -> Option<Self> {
        (points.len() >= 2).then_some(Self { points })
    }

    pub fn segment(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            points: vec![origin, destination],
        }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn origin(&self) -> Coordinate {
        self.points[0]
    }

    pub fn destination(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }
}

/// Origin and destination roles of one transport leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportLeg {
    pub origin: LocationRole,
    pub destination: LocationRole,
}

const PREP_TO_PROCESSING: TransportLeg = TransportLeg {
    origin: LocationRole::ProjectPrep,
    destination: LocationRole::Processing,
};

const PROCESSING_TO_FIELD: TransportLeg = TransportLeg {
    origin: LocationRole::Processing,
    destination: LocationRole::Application,
};

const BIOCHAR_LEGS: &[(EventCategory, TransportLeg)] = &[
    (EventCategory::FeedstockDelivery, PREP_TO_PROCESSING),
    (EventCategory::FeedstockToReactorDelivery, PREP_TO_PROCESSING),
    (EventCategory::BiocharDelivery, PROCESSING_TO_FIELD),
];

const ERW_LEGS: &[(EventCategory, TransportLeg)] = &[
    (EventCategory::FeedstockDeliverySourceToStaging, PREP_TO_PROCESSING),
    (EventCategory::FeedstockDeliveryStagingToField, PROCESSING_TO_FIELD),
    (EventCategory::TransportLogistics, PREP_TO_PROCESSING),
    (EventCategory::FieldMobilization, PROCESSING_TO_FIELD),
];

/// Transport table of a methodology.
pub fn transport_legs(methodology: Methodology) -> &'static [(EventCategory, TransportLeg)] {
    match methodology {
        Methodology::Biochar => BIOCHAR_LEGS,
        Methodology::EnhancedRockWeathering => ERW_LEGS,
    }
}

/// Leg for `category` under `methodology`, if it is a transport category there.
pub fn transport_leg(methodology: Methodology, category: EventCategory) -> Option<TransportLeg> {
    transport_legs(methodology)
        .iter()
        .find(|(candidate, _)| *candidate == category)
        .map(|(_, leg)| *leg)
}

/// Path to highlight for `event`, or `None`.
///
/// # Contract
/// - Non-transport categories return `None`.
/// - Transport categories return a two-point path when both endpoint roles
///   are known, else `None`.
pub fn resolve_highlighted_path(
    event: &LifecycleEvent,
    methodology: Methodology,
    known: &KnownLocations,
) -> Option<HighlightedPath> {
    let leg = transport_leg(methodology, event.category)?;
    let origin = known.get(leg.origin)?;
    let destination = known.get(leg.destination)?;
    Some(HighlightedPath::segment(origin, destination))
}

/// Always-shown paths: prep → processing and processing → application.
pub fn connector_paths(known: &KnownLocations) -> Vec<HighlightedPath> {
    [PREP_TO_PROCESSING, PROCESSING_TO_FIELD]
        .into_iter()
        .filter_map(|leg| {
            Some(HighlightedPath::segment(
                known.get(leg.origin)?,
                known.get(leg.destination)?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{transport_leg, transport_legs, HighlightedPath};
    use crate::model::coordinate::Coordinate;
    use crate::model::event::EventCategory;
    use crate::model::project::Methodology;

    #[test]
    fn tables_only_contain_transport_categories() {
        for methodology in [Methodology::Biochar, Methodology::EnhancedRockWeathering] {
            for (category, _) in transport_legs(methodology) {
                assert!(category.is_transport(), "{category} is not transport");
            }
        }
    }

    #[test]
    fn tables_do_not_leak_across_methodologies() {
        assert!(transport_leg(Methodology::EnhancedRockWeathering, EventCategory::BiocharDelivery).is_none());
        assert!(transport_leg(Methodology::Biochar, EventCategory::FieldMobilization).is_none());
    }

    #[test]
    fn path_requires_two_points() {
        assert!(HighlightedPath::new(vec![Coordinate::new(0.0, 0.0)]).is_none());
        let path = HighlightedPath::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)])
            .unwrap();
        assert_eq!(path.destination(), Coordinate::new(1.0, 1.0));
    }
}
