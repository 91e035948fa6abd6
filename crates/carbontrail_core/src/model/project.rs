//! Project aggregate.
//!
//! # Responsibility
//! - Own the ordered lifecycle event sequence of one carbon-removal project.
//! - Carry methodology, home coordinate and reporting figures.
//!
//! # Invariants
//! - Event order is chronological intent; ids are unique within a project.
//! - Canonical locations default to the methodology preset when not
//!   overridden.

use super::coordinate::Coordinate;
use super::event::{EventValidationError, LifecycleEvent};
use super::location::{CanonicalLocations, LocationConfigError};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PROJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:-]*$").expect("valid project id regex"));

/// Carbon removal methodology of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    #[default]
    Biochar,
    EnhancedRockWeathering,
}

impl Methodology {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Biochar => "biochar",
            Self::EnhancedRockWeathering => "enhanced_rock_weathering",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Biochar => "Biochar",
            Self::EnhancedRockWeathering => "Enhanced Rock Weathering",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "biochar" => Some(Self::Biochar),
            "enhanced_rock_weathering" => Some(Self::EnhancedRockWeathering),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMaterial {
    pub name: String,
    pub percentage: f64,
    pub weight: f64,
    pub unit: String,
}

/// Feedstock batch composition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    #[serde(default)]
    pub materials: Vec<BatchMaterial>,
    #[serde(default)]
    pub total_weight: f64,
    #[serde(default)]
    pub unit: String,
}

/// Inputs of the gross removals calculation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrossRemovals {
    #[serde(default)]
    pub material_amount: f64,
    #[serde(default)]
    pub stable_carbon_factor: f64,
    #[serde(default)]
    pub negative_emission_conversion: f64,
    #[serde(default, rename = "co2CRatio")]
    pub co2_c_ratio: String,
}

/// One carbon-removal project and its lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub methodology: Methodology,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// External registry identifier, distinct from `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_design_document: Option<String>,
    #[serde(default)]
    pub co2_quantity: f64,
    /// Home coordinate shown when nothing is selected.
    pub location: Coordinate,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub batch_info: BatchInfo,
    #[serde(default)]
    pub gross_removals: GrossRemovals,
    #[serde(default)]
    pub events: Vec<LifecycleEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_locations: Option<CanonicalLocations>,
}

/// Project-level data and configuration defects.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectValidationError {
    InvalidId(String),
    NonFiniteHome,
    DuplicateEventId(String),
    InvalidEvent {
        index: usize,
        source: EventValidationError,
    },
    Locations(LocationConfigError),
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(f, "project id is invalid: `{value}`"),
            Self::NonFiniteHome => write!(f, "project home coordinate is not finite"),
            Self::DuplicateEventId(id) => write!(f, "duplicate event id `{id}`"),
            Self::InvalidEvent { index, source } => write!(f, "event #{index}: {source}"),
            Self::Locations(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEvent { source, .. } => Some(source),
            Self::Locations(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LocationConfigError> for ProjectValidationError {
    fn from(value: LocationConfigError) -> Self {
        Self::Locations(value)
    }
}

impl Project {
    /// Creates an empty project with default reporting figures.
    pub fn new(id: impl Into<String>, methodology: Methodology, location: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            methodology,
            protocol: None,
            project_id: None,
            project_design_document: None,
            co2_quantity: 0.0,
            location,
            date: String::new(),
            batch_info: BatchInfo::default(),
            gross_removals: GrossRemovals::default(),
            events: Vec::new(),
            canonical_locations: None,
        }
    }

    /// Returns the active canonical anchors.
    pub fn canonical_locations(&self) -> &CanonicalLocations {
        self.canonical_locations
            .as_ref()
            .unwrap_or_else(|| CanonicalLocations::preset(self.methodology))
    }

    /// Event at `index`, if any.
    pub fn event(&self, index: usize) -> Option<&LifecycleEvent> {
        self.events.get(index)
    }

    /// Displayed gross removals figure.
    ///
    /// `offset_kg` comes from `EngineConfig::gross_removals_offset_kg`.
    pub fn gross_removals_total(&self, offset_kg: f64) -> f64 {
        self.co2_quantity + offset_kg
    }

    /// Sum of all signed event impacts.
    pub fn net_event_impact(&self) -> f64 {
        self.events.iter().map(|event| event.co2_impact).sum()
    }

    /// Validates identity, events and anchor configuration.
    ///
    /// # Errors
    /// - Returns an error for an empty or malformed project id.
    /// - Returns the first invalid event, with its index.
    /// - Returns an error for duplicate event ids.
    /// - Returns an error for overlapping canonical anchors.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        let result = self.validate_inner();
        if let Err(err) = &result {
            warn!(
                "event=project_validate module=model status=error project_id={} error={}",
                self.id, err
            );
        }
        result
    }

    fn validate_inner(&self) -> Result<(), ProjectValidationError> {
        if !PROJECT_ID_RE.is_match(&self.id) {
            return Err(ProjectValidationError::InvalidId(self.id.clone()));
        }
        if !self.location.is_finite() {
            return Err(ProjectValidationError::NonFiniteHome);
        }

        let mut seen = HashSet::with_capacity(self.events.len());
        for (index, event) in self.events.iter().enumerate() {
            event
                .validate()
                .map_err(|source| ProjectValidationError::InvalidEvent { index, source })?;
            if !seen.insert(event.id.as_str()) {
                return Err(ProjectValidationError::DuplicateEventId(event.id.clone()));
            }
        }

        if let Some(anchors) = &self.canonical_locations {
            // Anchors deserialize through validation, but may be built in code.
            CanonicalLocations::new(anchors.iter().cloned().collect())?;
        }
        Ok(())
    }
}
