//! Canonical project locations.
//!
//! # Responsibility
//! - Define the three named anchor sites every project is organized around.
//! - Provide per-methodology presets.
//! - Reject anchor sets whose tolerance boxes overlap.
//!
//! # Invariants
//! - A `CanonicalLocations` set holds exactly one anchor per `LocationRole`,
//!   stored in role order.
//! - No coordinate can fall inside two anchors' tolerance boxes.

use super::coordinate::Coordinate;
use super::project::Methodology;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default proximity tolerance in degrees (~110 m).
pub const DEFAULT_TOLERANCE_DEG: f64 = 0.001;

/// Role of a canonical location in the project lifecycle.
///
/// Declaration order is the classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRole {
    /// Feedstock source / provisioning site.
    ProjectPrep,
    /// Pyrolysis plant or staging grounds.
    Processing,
    /// Field where the carbon product is applied.
    Application,
}

impl LocationRole {
    pub const ALL: [LocationRole; 3] = [Self::ProjectPrep, Self::Processing, Self::Application];

    pub fn index(self) -> usize {
        match self {
            Self::ProjectPrep => 0,
            Self::Processing => 1,
            Self::Application => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectPrep => "project_prep",
            Self::Processing => "processing",
            Self::Application => "application",
        }
    }

    /// Icon key the marker resolver understands for this role.
    pub fn icon_key(self, methodology: Methodology) -> &'static str {
        match (methodology, self) {
            (Methodology::Biochar, Self::ProjectPrep) => "project_prep",
            (Methodology::Biochar, Self::Processing) => "pyrolysis_plant",
            (Methodology::Biochar, Self::Application) => "application_field",
            (Methodology::EnhancedRockWeathering, Self::ProjectPrep) => "feedstock_source",
            (Methodology::EnhancedRockWeathering, Self::Processing) => "staging_grounds",
            (Methodology::EnhancedRockWeathering, Self::Application) => "application_field",
        }
    }
}

impl Display for LocationRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named anchor site with a proximity tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalLocation {
    pub role: LocationRole,
    pub label: String,
    pub coordinate: Coordinate,
    /// Max per-axis deviation in degrees still considered "at" this site.
    pub tolerance_deg: f64,
}

impl CanonicalLocation {
    pub fn new(
        role: LocationRole,
        label: impl Into<String>,
        coordinate: Coordinate,
        tolerance_deg: f64,
    ) -> Self {
        Self {
            role,
            label: label.into(),
            coordinate,
            tolerance_deg,
        }
    }

    /// Strict per-axis box test; a point exactly on the edge is outside.
    pub fn contains(&self, point: Coordinate) -> bool {
        crate::spatial::bounds::within_tolerance(self.coordinate, point, self.tolerance_deg)
    }

    fn overlaps(&self, other: &CanonicalLocation) -> bool {
        let reach = self.tolerance_deg + other.tolerance_deg;
        (self.coordinate.lat - other.coordinate.lat).abs() < reach
            && (self.coordinate.lng - other.coordinate.lng).abs() < reach
    }
}

/// Anchor configuration defects.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationConfigError {
    WrongAnchorCount(usize),
    DuplicateRole(LocationRole),
    InvalidTolerance { role: LocationRole, tolerance_deg: f64 },
    NonFiniteAnchor(LocationRole),
    OverlappingAnchors { first: LocationRole, second: LocationRole },
}

impl Display for LocationConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongAnchorCount(count) => {
                write!(f, "expected exactly 3 canonical locations, got {count}")
            }
            Self::DuplicateRole(role) => write!(f, "canonical location role `{role}` is repeated"),
            Self::InvalidTolerance {
                role,
                tolerance_deg,
            } => write!(
                f,
                "canonical location `{role}` has invalid tolerance {tolerance_deg}; expected a finite value > 0"
            ),
            Self::NonFiniteAnchor(role) => {
                write!(f, "canonical location `{role}` has a non-finite coordinate")
            }
            Self::OverlappingAnchors { first, second } => write!(
                f,
                "canonical locations `{first}` and `{second}` have overlapping tolerance regions"
            ),
        }
    }
}

impl Error for LocationConfigError {}

/// Validated set of the three canonical anchors of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CanonicalLocation>", into = "Vec<CanonicalLocation>")]
pub struct CanonicalLocations {
    anchors: Vec<CanonicalLocation>,
}

impl CanonicalLocations {
    /// Builds a set from anchors in any order.
    ///
    /// # Errors
    /// - Returns an error when roles are missing or repeated.
    /// - Returns an error for non-finite coordinates or tolerances <= 0.
    /// - Returns an error when two tolerance boxes overlap.
    pub fn new(mut anchors: Vec<CanonicalLocation>) -> Result<Self, LocationConfigError> {
        if anchors.len() != LocationRole::ALL.len() {
            return Err(LocationConfigError::WrongAnchorCount(anchors.len()));
        }
        anchors.sort_by_key(|anchor| anchor.role);
        for pair in anchors.windows(2) {
            if pair[0].role == pair[1].role {
                return Err(LocationConfigError::DuplicateRole(pair[0].role));
            }
        }
        for anchor in &anchors {
            if !anchor.coordinate.is_finite() {
                return Err(LocationConfigError::NonFiniteAnchor(anchor.role));
            }
            if !anchor.tolerance_deg.is_finite() || anchor.tolerance_deg <= 0.0 {
                return Err(LocationConfigError::InvalidTolerance {
                    role: anchor.role,
                    tolerance_deg: anchor.tolerance_deg,
                });
            }
        }
        for (i, first) in anchors.iter().enumerate() {
            for second in &anchors[i + 1..] {
                if first.overlaps(second) {
                    return Err(LocationConfigError::OverlappingAnchors {
                        first: first.role,
                        second: second.role,
                    });
                }
            }
        }
        Ok(Self { anchors })
    }

    /// Built-in anchors for a methodology.
    pub fn preset(methodology: Methodology) -> &'static CanonicalLocations {
        match methodology {
            Methodology::Biochar => &BIOCHAR_PRESET,
            Methodology::EnhancedRockWeathering => &ERW_PRESET,
        }
    }

    /// Anchors in classification order.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalLocation> {
        self.anchors.iter()
    }

    pub fn get(&self, role: LocationRole) -> &CanonicalLocation {
        &self.anchors[role.index()]
    }
}

impl TryFrom<Vec<CanonicalLocation>> for CanonicalLocations {
    type Error = LocationConfigError;

    fn try_from(value: Vec<CanonicalLocation>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CanonicalLocations> for Vec<CanonicalLocation> {
    fn from(value: CanonicalLocations) -> Self {
        value.anchors
    }
}

fn preset_anchors(entries: [(LocationRole, &str, f64, f64); 3]) -> CanonicalLocations {
    let anchors = entries
        .into_iter()
        .map(|(role, label, lat, lng)| {
            CanonicalLocation::new(role, label, Coordinate::new(lat, lng), DEFAULT_TOLERANCE_DEG)
        })
        .collect::<Vec<_>>();
    CanonicalLocations::new(anchors).expect("built-in canonical presets are non-overlapping")
}

static BIOCHAR_PRESET: Lazy<CanonicalLocations> = Lazy::new(|| {
    preset_anchors([
        (
            LocationRole::ProjectPrep,
            "Provisioning, Planning and Delivery Location",
            20.9211,
            -156.3051,
        ),
        (LocationRole::Processing, "Reactor Location", 20.9211, -156.3087),
        (LocationRole::Application, "Farm Location", 20.9350, -156.5100),
    ])
});

static ERW_PRESET: Lazy<CanonicalLocations> = Lazy::new(|| {
    preset_anchors([
        (
            LocationRole::ProjectPrep,
            "Feedstock Source (Premier Aggregates)",
            43.4862,
            -116.1265,
        ),
        (
            LocationRole::Processing,
            "Malama Basecamp (Idaho City)",
            43.8055,
            -115.8672,
        ),
        (
            LocationRole::Application,
            "Field Location (Application Site)",
            43.8251,
            -115.8903,
        ),
    ])
});
