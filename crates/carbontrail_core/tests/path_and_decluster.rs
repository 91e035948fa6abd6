use carbontrail_core::model::coordinate::Coordinate;
use carbontrail_core::model::event::{EventCategory, LifecycleEvent};
use carbontrail_core::model::location::LocationRole;
use carbontrail_core::model::project::Methodology;
use carbontrail_core::spatial::classifier::KnownLocations;
use carbontrail_core::spatial::decluster::{decluster_events, decluster_group};
use carbontrail_core::spatial::path::{connector_paths, resolve_highlighted_path, transport_leg};
use chrono::{TimeZone, Utc};

const PREP: Coordinate = Coordinate::new(43.4862, -116.1265);
const STAGING: Coordinate = Coordinate::new(43.8055, -115.8672);
const FIELD: Coordinate = Coordinate::new(43.8251, -115.8903);

fn event(category: EventCategory, coordinate: Coordinate) -> LifecycleEvent {
    LifecycleEvent::new(
        format!("{}-evt", category.as_str()),
        category,
        coordinate,
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    )
}

fn all_known() -> KnownLocations {
    KnownLocations::from_parts(Some(PREP), Some(STAGING), Some(FIELD))
}

#[test]
fn non_transport_categories_never_highlight() {
    let known = all_known();
    for methodology in [Methodology::Biochar, Methodology::EnhancedRockWeathering] {
        for category in EventCategory::ALL
            .into_iter()
            .filter(|category| !category.is_transport())
        {
            assert_eq!(
                resolve_highlighted_path(&event(category, PREP), methodology, &known),
                None,
                "{category} under {methodology:?}"
            );
        }
    }
}

#[test]
fn every_tabled_transport_category_resolves_when_endpoints_known() {
    let known = all_known();
    let erw = [
        (EventCategory::FeedstockDeliverySourceToStaging, PREP, STAGING),
        (EventCategory::TransportLogistics, PREP, STAGING),
        (EventCategory::FeedstockDeliveryStagingToField, STAGING, FIELD),
        (EventCategory::FieldMobilization, STAGING, FIELD),
    ];
    for (category, origin, destination) in erw {
        let path = resolve_highlighted_path(
            &event(category, FIELD),
            Methodology::EnhancedRockWeathering,
            &known,
        )
        .unwrap_or_else(|| panic!("{category} should highlight"));
        assert_eq!(path.points(), &[origin, destination]);
    }
}

#[test]
fn biochar_table_has_no_erw_fallback() {
    let known = all_known();
    assert!(transport_leg(Methodology::Biochar, EventCategory::FieldMobilization).is_none());
    assert!(resolve_highlighted_path(
        &event(EventCategory::FieldMobilization, PREP),
        Methodology::Biochar,
        &known
    )
    .is_none());

    let delivery = resolve_highlighted_path(
        &event(EventCategory::BiocharDelivery, PREP),
        Methodology::Biochar,
        &known,
    )
    .unwrap();
    assert_eq!(delivery.origin(), STAGING);
    assert_eq!(delivery.destination(), FIELD);
}

#[test]
fn unknown_endpoint_yields_no_path() {
    let known = KnownLocations::from_parts(Some(PREP), None, Some(FIELD));
    assert!(resolve_highlighted_path(
        &event(EventCategory::FeedstockDelivery, PREP),
        Methodology::Biochar,
        &known
    )
    .is_none());
    assert!(connector_paths(&known).is_empty());
    assert_eq!(known.get(LocationRole::Processing), None);
}

#[test]
fn connectors_need_both_endpoints() {
    let known = KnownLocations::from_parts(Some(PREP), Some(STAGING), None);
    let connectors = connector_paths(&known);
    assert_eq!(connectors.len(), 1);
    assert_eq!(connectors[0].points(), &[PREP, STAGING]);
    assert_eq!(connector_paths(&all_known()).len(), 2);
}

#[test]
fn decluster_group_preserves_order_and_centroid() {
    let events = (0..7)
        .map(|_| event(EventCategory::SensorReading, FIELD))
        .collect::<Vec<_>>();
    let refs = events.iter().collect::<Vec<_>>();
    let positions = decluster_group(&refs, 0.0004);
    assert_eq!(positions.len(), 7);

    let (sum_lat, sum_lng) = positions.iter().fold((0.0, 0.0), |(lat, lng), point| {
        (lat + point.lat - FIELD.lat, lng + point.lng - FIELD.lng)
    });
    assert!(sum_lat.abs() < 1e-9);
    assert!(sum_lng.abs() < 1e-9);

    let mut unique = positions
        .iter()
        .map(|point| point.rounded_key(6))
        .collect::<Vec<_>>();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 7);
}

#[test]
fn single_event_is_not_moved() {
    let only = event(EventCategory::RockApplication, FIELD);
    assert_eq!(decluster_group(&[&only], 0.0004), vec![FIELD]);
}

#[test]
fn grouping_key_uses_four_decimals_not_anchor_membership() {
    let a = event(EventCategory::SensorReading, Coordinate::new(1.00001, 2.00001));
    let b = event(EventCategory::SensorReading, Coordinate::new(1.00002, 2.00002));
    let far = event(EventCategory::SensorReading, Coordinate::new(1.01, 2.01));
    let placed = decluster_events(&[&a, &b, &far], 0.0004, 4);

    assert_eq!(placed.len(), 3);
    assert_eq!(placed[0].event.coordinate, a.coordinate);
    assert_ne!(placed[0].position, a.coordinate);
    assert_ne!(placed[0].position, placed[1].position);
    assert_eq!(placed[2].position, far.coordinate);
}
