//! Geographic coordinate value type.
//!
//! # Invariants
//! - Coordinates are plain WGS84 degrees copied by value.
//! - No projection is applied; all math is lat/lng rectangle math.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns whether both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Returns a copy shifted by the given latitude/longitude deltas.
    pub fn offset(&self, d_lat: f64, d_lng: f64) -> Self {
        Self::new(self.lat + d_lat, self.lng + d_lng)
    }

    /// Rounds both components to `decimals` places.
    ///
    /// Used as a grouping key, so the result is returned as scaled integers
    /// to keep it hashable.
    pub fn rounded_key(&self, decimals: u32) -> (i64, i64) {
        let scale = 10f64.powi(decimals as i32);
        (
            (self.lat * scale).round() as i64,
            (self.lng * scale).round() as i64,
        )
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ns = if self.lat < 0.0 { 'S' } else { 'N' };
        let ew = if self.lng < 0.0 { 'W' } else { 'E' };
        write!(
            f,
            "{:.4}°{ns}, {:.4}°{ew}",
            self.lat.abs(),
            self.lng.abs()
        )
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}
