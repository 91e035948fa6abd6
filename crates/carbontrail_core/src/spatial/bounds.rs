//! Rectangle math on lat/lng degrees.

use crate::model::coordinate::Coordinate;
use geo::{BoundingRect, Coord, LineString};
use serde::{Deserialize, Serialize};

/// Strict per-axis proximity test.
pub fn within_tolerance(anchor: Coordinate, point: Coordinate, tolerance_deg: f64) -> bool {
    (point.lat - anchor.lat).abs() < tolerance_deg && (point.lng - anchor.lng).abs() < tolerance_deg
}

/// Axis-aligned lat/lng rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Bounds {
    /// Builds the rectangle spanned by two corners in any order.
    pub fn from_corners(a: Coordinate, b: Coordinate) -> Self {
        Self {
            south_west: Coordinate::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: Coordinate::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Square of side `side_deg` centered on `center`.
    pub fn square_around(center: Coordinate, side_deg: f64) -> Self {
        let half = side_deg / 2.0;
        Self::from_corners(
            center.offset(-half, -half),
            center.offset(half, half),
        )
    }

    /// Smallest rectangle containing every coordinate; `None` when empty.
    pub fn from_coordinates<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let line: LineString<f64> = coordinates
            .into_iter()
            .map(|coordinate| Coord {
                x: coordinate.lng,
                y: coordinate.lat,
            })
            .collect::<Vec<_>>()
            .into();
        let rect = line.bounding_rect()?;
        Some(Self {
            south_west: Coordinate::new(rect.min().y, rect.min().x),
            north_east: Coordinate::new(rect.max().y, rect.max().x),
        })
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            south_west: Coordinate::new(
                self.south_west.lat.min(other.south_west.lat),
                self.south_west.lng.min(other.south_west.lng),
            ),
            north_east: Coordinate::new(
                self.north_east.lat.max(other.north_east.lat),
                self.north_east.lng.max(other.north_east.lng),
            ),
        }
    }

    /// Grows the rectangle to include `point`.
    pub fn extend(&self, point: Coordinate) -> Self {
        self.union(&Self::from_corners(point, point))
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat
    }

    pub fn south(&self) -> f64 {
        self.south_west.lat
    }

    pub fn east(&self) -> f64 {
        self.north_east.lng
    }

    pub fn west(&self) -> f64 {
        self.south_west.lng
    }

    /// North-south extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north() - self.south()
    }

    pub fn lng_span(&self) -> f64 {
        self.east() - self.west()
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.north() + self.south()) / 2.0,
            (self.east() + self.west()) / 2.0,
        )
    }

    /// Inclusive containment.
    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.south()
            && point.lat <= self.north()
            && point.lng >= self.west()
            && point.lng <= self.east()
    }
}

#[cfg(test)]
mod tests {
    use super::{within_tolerance, Bounds};
    use crate::model::coordinate::Coordinate;

    #[test]
    fn within_tolerance_is_strict_on_both_axes() {
        let anchor = Coordinate::new(10.0, 20.0);
        assert!(within_tolerance(anchor, Coordinate::new(10.0009, 19.9991), 0.001));
        assert!(!within_tolerance(anchor, Coordinate::new(10.0, 20.0011), 0.001));
        assert!(!within_tolerance(anchor, Coordinate::new(10.0011, 20.0), 0.001));
    }

    #[test]
    fn from_coordinates_spans_all_points() {
        let bounds = Bounds::from_coordinates([
            Coordinate::new(1.0, 5.0),
            Coordinate::new(-2.0, 7.0),
            Coordinate::new(0.5, -1.0),
        ])
        .unwrap();
        assert_eq!(bounds.south_west, Coordinate::new(-2.0, -1.0));
        assert_eq!(bounds.north_east, Coordinate::new(1.0, 7.0));
        assert!(Bounds::from_coordinates(Vec::new()).is_none());
    }

    #[test]
    fn square_around_is_centered() {
        let center = Coordinate::new(20.9211, -156.3051);
        let square = Bounds::square_around(center, 0.0057);
        assert!((square.lat_span() - 0.0057).abs() < 1e-12);
        assert!((square.lng_span() - 0.0057).abs() < 1e-12);
        assert!((square.center().lat - center.lat).abs() < 1e-12);
        assert!(square.contains(center));
    }

    #[test]
    fn union_and_extend_grow_rectangle() {
        let a = Bounds::from_corners(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0));
        let b = Bounds::from_corners(Coordinate::new(2.0, -1.0), Coordinate::new(3.0, 0.5));
        let merged = a.union(&b);
        assert_eq!(merged.south_west, Coordinate::new(0.0, -1.0));
        assert_eq!(merged.north_east, Coordinate::new(3.0, 1.0));
        assert_eq!(a.extend(Coordinate::new(-1.0, 4.0)).north_east.lng, 4.0);
    }
}
