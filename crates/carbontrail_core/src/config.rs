//! Engine configuration.
//!
//! # Responsibility
//! - Hold the tunable constants of viewport, declustering and playback.
//! - Load overrides from JSON, defaulting every omitted field.
//!
//! # Invariants
//! - A validated config has finite, positive sizes and zoom caps within the
//!   tile range.

use crate::playback::PlaybackSpeed;
use crate::spatial::decluster::{DEFAULT_BASE_OFFSET_DEG, DEFAULT_GROUP_PRECISION};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_TILE_ZOOM: u8 = 22;
const MAX_GROUP_PRECISION: u32 = 8;

/// Gross removals display adjustment (kg CO₂e).
pub const DEFAULT_GROSS_REMOVALS_OFFSET_KG: f64 = 2.47;

/// Padding/zoom-cap pair used when fitting a bounds rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitPolicy {
    pub padding_px: u32,
    pub max_zoom: u8,
}

/// Viewport tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportPolicy {
    /// Side of the fixed-area square framed around non-transport events
    /// (0.0057° ≈ 632 m, about 100 acres).
    pub location_square_deg: f64,
    /// Bounds with a smaller north-south extent are fitted tightly.
    pub tight_threshold_deg: f64,
    pub tight: FitPolicy,
    pub loose: FitPolicy,
    /// Zoom for a single selected coordinate.
    pub selected_zoom: u8,
    /// Zoom for the home coordinate.
    pub home_zoom: u8,
    /// Frame the whole route network when a highlighted path is active.
    pub zoom_to_path: bool,
}

impl Default for ViewportPolicy {
    fn default() -> Self {
        Self {
            location_square_deg: 0.0057,
            tight_threshold_deg: 0.02,
            tight: FitPolicy {
                padding_px: 100,
                max_zoom: 18,
            },
            loose: FitPolicy {
                padding_px: 50,
                max_zoom: 16,
            },
            selected_zoom: 15,
            home_zoom: 13,
            zoom_to_path: true,
        }
    }
}

/// Marker declustering tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclusterPolicy {
    pub base_offset_deg: f64,
    /// Decimal places used to build group keys.
    pub group_precision: u32,
}

impl Default for DeclusterPolicy {
    fn default() -> Self {
        Self {
            base_offset_deg: DEFAULT_BASE_OFFSET_DEG,
            group_precision: DEFAULT_GROUP_PRECISION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    pub speed: PlaybackSpeed,
}

/// Which lifecycle events get a marker besides the canonical locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerVisibility {
    /// Only the focused event.
    #[default]
    SelectedOnly,
    All,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub viewport: ViewportPolicy,
    pub decluster: DeclusterPolicy,
    pub playback: PlaybackDefaults,
    pub markers: MarkerVisibility,
    pub gross_removals_offset_kg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportPolicy::default(),
            decluster: DeclusterPolicy::default(),
            playback: PlaybackDefaults::default(),
            markers: MarkerVisibility::default(),
            gross_removals_offset_kg: DEFAULT_GROSS_REMOVALS_OFFSET_KG,
        }
    }
}

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    OutOfRange {
        field: &'static str,
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid engine config: {err}"),
            Self::OutOfRange { field, value } => {
                write!(f, "engine config field `{field}` is out of range: {value}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::OutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl EngineConfig {
    /// Parses a JSON config and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every size is finite and positive and zoom caps are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let viewport = &self.viewport;
        positive("viewport.location_square_deg", viewport.location_square_deg)?;
        positive("viewport.tight_threshold_deg", viewport.tight_threshold_deg)?;
        positive("decluster.base_offset_deg", self.decluster.base_offset_deg)?;
        zoom("viewport.tight.max_zoom", viewport.tight.max_zoom)?;
        zoom("viewport.loose.max_zoom", viewport.loose.max_zoom)?;
        zoom("viewport.selected_zoom", viewport.selected_zoom)?;
        zoom("viewport.home_zoom", viewport.home_zoom)?;
        if self.decluster.group_precision > MAX_GROUP_PRECISION {
            return Err(ConfigError::OutOfRange {
                field: "decluster.group_precision",
                value: self.decluster.group_precision.to_string(),
            });
        }
        if !self.gross_removals_offset_kg.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "gross_removals_offset_kg",
                value: self.gross_removals_offset_kg.to_string(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
        })
    }
}

fn zoom(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if value <= MAX_TILE_ZOOM {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
        })
    }
}
