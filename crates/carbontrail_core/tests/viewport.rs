use carbontrail_core::config::ViewportPolicy;
use carbontrail_core::model::coordinate::Coordinate;
use carbontrail_core::model::event::{EventCategory, LifecycleEvent};
use carbontrail_core::spatial::bounds::Bounds;
use carbontrail_core::spatial::classifier::KnownLocations;
use carbontrail_core::spatial::path::{connector_paths, HighlightedPath};
use carbontrail_core::view::viewport::{
    compute_viewport, location_bounds, ViewportInput, ViewportTarget,
};
use chrono::{TimeZone, Utc};

const HOME: Coordinate = Coordinate::new(20.92, -156.40);
const PREP: Coordinate = Coordinate::new(20.9211, -156.3051);
const REACTOR: Coordinate = Coordinate::new(20.9211, -156.3087);
const FARM: Coordinate = Coordinate::new(20.9350, -156.5100);

fn event(category: EventCategory, coordinate: Coordinate) -> LifecycleEvent {
    LifecycleEvent::new(
        "e",
        category,
        coordinate,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn known() -> KnownLocations {
    KnownLocations::from_parts(Some(PREP), Some(REACTOR), Some(FARM))
}

#[test]
fn nothing_selected_centers_on_home() {
    let policy = ViewportPolicy::default();
    let known = known();
    let connectors = connector_paths(&known);
    let target = compute_viewport(&ViewportInput::home(HOME, &known, &connectors), &policy);
    assert_eq!(
        target,
        ViewportTarget::Center {
            center: HOME,
            zoom: 13
        }
    );
}

#[test]
fn non_transport_event_frames_fixed_square_tightly() {
    let policy = ViewportPolicy::default();
    let known = known();
    let connectors = connector_paths(&known);
    let pyrolysis = event(EventCategory::Pyrolysis, REACTOR);

    let mut input = ViewportInput::home(HOME, &known, &connectors);
    input.selected = Some(&pyrolysis);
    input.location_bounds = location_bounds(&pyrolysis, &policy);

    match compute_viewport(&input, &policy) {
        ViewportTarget::Fit {
            bounds,
            padding_px,
            max_zoom,
        } => {
            assert!((bounds.lat_span() - 0.0057).abs() < 1e-9);
            assert!((bounds.lng_span() - 0.0057).abs() < 1e-9);
            assert!((bounds.center().lat - REACTOR.lat).abs() < 1e-9);
            assert_eq!(padding_px, 100);
            assert_eq!(max_zoom, 18);
        }
        other => panic!("expected fit target, got {other:?}"),
    }
}

#[test]
fn transport_event_frames_whole_route_network() {
    let policy = ViewportPolicy::default();
    let known = known();
    let connectors = connector_paths(&known);
    let delivery = event(EventCategory::BiocharDelivery, REACTOR);
    let path = HighlightedPath::segment(REACTOR, FARM);

    assert!(location_bounds(&delivery, &policy).is_none());
    let mut input = ViewportInput::home(HOME, &known, &connectors);
    input.selected = Some(&delivery);
    input.highlighted_path = Some(&path);

    let expected = Bounds::from_corners(
        Coordinate::new(20.9211, -156.5100),
        Coordinate::new(20.9350, -156.3051),
    );
    match compute_viewport(&input, &policy) {
        ViewportTarget::Fit {
            bounds,
            padding_px,
            max_zoom,
        } => {
            assert_eq!(bounds, expected);
            // 0.0139° north-south extent is below the 0.02° tight threshold.
            assert_eq!((padding_px, max_zoom), (100, 18));
        }
        other => panic!("expected fit target, got {other:?}"),
    }
}

#[test]
fn wide_route_network_gets_loose_policy() {
    let policy = ViewportPolicy::default();
    let far_field = Coordinate::new(43.8251, -115.8903);
    let known = KnownLocations::from_parts(
        Some(Coordinate::new(43.4862, -116.1265)),
        Some(Coordinate::new(43.8055, -115.8672)),
        Some(far_field),
    );
    let connectors = connector_paths(&known);
    let path = connectors[1].clone();
    let mobilization = event(EventCategory::FieldMobilization, far_field);

    let mut input = ViewportInput::home(HOME, &known, &connectors);
    input.playback_event = Some(&mobilization);
    input.highlighted_path = Some(&path);

    match compute_viewport(&input, &policy) {
        ViewportTarget::Fit {
            padding_px,
            max_zoom,
            ..
        } => assert_eq!((padding_px, max_zoom), (50, 16)),
        other => panic!("expected fit target, got {other:?}"),
    }
}

#[test]
fn path_zoom_disabled_falls_back_to_center() {
    let policy = ViewportPolicy {
        zoom_to_path: false,
        ..ViewportPolicy::default()
    };
    let known = known();
    let connectors = connector_paths(&known);
    let delivery = event(EventCategory::BiocharDelivery, REACTOR);
    let path = HighlightedPath::segment(REACTOR, FARM);

    let mut input = ViewportInput::home(HOME, &known, &connectors);
    input.selected = Some(&delivery);
    input.highlighted_path = Some(&path);
    assert_eq!(
        compute_viewport(&input, &policy),
        ViewportTarget::Center {
            center: REACTOR,
            zoom: 15
        }
    );
}

#[test]
fn playback_event_wins_over_selection() {
    let policy = ViewportPolicy::default();
    let known = KnownLocations::default();
    let selected = event(EventCategory::FeedstockDelivery, PREP);
    let playing = event(EventCategory::FeedstockDelivery, FARM);

    let mut input = ViewportInput::home(HOME, &known, &[]);
    input.selected = Some(&selected);
    input.playback_event = Some(&playing);
    assert_eq!(
        compute_viewport(&input, &policy),
        ViewportTarget::Center {
            center: FARM,
            zoom: 15
        }
    );
}

#[test]
fn extent_threshold_separates_site_from_route() {
    let policy = ViewportPolicy::default();
    let known = KnownLocations::default();
    let mut input = ViewportInput::home(HOME, &known, &[]);

    input.location_bounds = Some(Bounds::from_corners(
        Coordinate::new(10.0, 10.0),
        Coordinate::new(10.01, 10.3),
    ));
    assert!(matches!(
        compute_viewport(&input, &policy),
        ViewportTarget::Fit {
            padding_px: 100,
            max_zoom: 18,
            ..
        }
    ));

    input.location_bounds = Some(Bounds::from_corners(
        Coordinate::new(10.0, 10.0),
        Coordinate::new(10.05, 10.01),
    ));
    assert!(matches!(
        compute_viewport(&input, &policy),
        ViewportTarget::Fit {
            padding_px: 50,
            max_zoom: 16,
            ..
        }
    ));
}
