//! Lifecycle event domain model.
//!
//! # Responsibility
//! - Define the immutable record for one geotagged project lifecycle step.
//! - Validate raw wire records before they reach playback/viewport layers.
//!
//! # Invariants
//! - `timestamp` always holds a parsed instant; unparseable input is rejected
//!   at deserialization time.
//! - `coordinate` and `co2_impact` are finite.
//! - Events are never mutated after load.

use super::coordinate::Coordinate;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Closed set of lifecycle event categories.
///
/// Covers both biochar and enhanced rock weathering projects; which
/// categories are transport legs for a given methodology lives in
/// `spatial::path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    FeedstockProvisioning,
    FeedstockDelivery,
    FeedstockToReactorDelivery,
    Pyrolysis,
    BiocharDelivery,
    BiocharApplication,
    SensorReading,
    FarmContract,
    FarmReport,
    BaselineReport,
    DeliveryScheduling,
    BiocharLabTest,
    BiocharBagging,
    FarmSelection,
    MonitoringReport,
    RockCharacterization,
    RockWeighing,
    TransportLogistics,
    FeedstockIntake,
    BaselineLabPrep,
    FieldMobilization,
    BaselineEstablishment,
    RockApplication,
    Verification,
    EnvironmentalMonitoring,
    NetCdrCalculation,
    FeedstockDeliverySourceToStaging,
    FeedstockReceivedStaging,
    FeedstockDeliveryStagingToField,
    FeedstockReceivedField,
    StakeholderEngagement,
    WasteVerification,
    ReactorDesignValidation,
    EmissionsMonitoring,
    SafetyScreening,
    CarbonStabilityTest,
    CertifiedWeighIn,
    ApplicationLossAccounting,
    NetCreditMinting,
}

impl EventCategory {
    /// Every category, in declaration order.
    pub const ALL: [EventCategory; 39] = [
        Self::FeedstockProvisioning,
        Self::FeedstockDelivery,
        Self::FeedstockToReactorDelivery,
        Self::Pyrolysis,
        Self::BiocharDelivery,
        Self::BiocharApplication,
        Self::SensorReading,
        Self::FarmContract,
        Self::FarmReport,
        Self::BaselineReport,
        Self::DeliveryScheduling,
        Self::BiocharLabTest,
        Self::BiocharBagging,
        Self::FarmSelection,
        Self::MonitoringReport,
        Self::RockCharacterization,
        Self::RockWeighing,
        Self::TransportLogistics,
        Self::FeedstockIntake,
        Self::BaselineLabPrep,
        Self::FieldMobilization,
        Self::BaselineEstablishment,
        Self::RockApplication,
        Self::Verification,
        Self::EnvironmentalMonitoring,
        Self::NetCdrCalculation,
        Self::FeedstockDeliverySourceToStaging,
        Self::FeedstockReceivedStaging,
        Self::FeedstockDeliveryStagingToField,
        Self::FeedstockReceivedField,
        Self::StakeholderEngagement,
        Self::WasteVerification,
        Self::ReactorDesignValidation,
        Self::EmissionsMonitoring,
        Self::SafetyScreening,
        Self::CarbonStabilityTest,
        Self::CertifiedWeighIn,
        Self::ApplicationLossAccounting,
        Self::NetCreditMinting,
    ];

    /// Returns whether this category moves material between sites.
    ///
    /// Transport events are framed by their route instead of a fixed-area
    /// square around the event coordinate.
    pub fn is_transport(self) -> bool {
        matches!(
            self,
            Self::FeedstockDelivery
                | Self::FeedstockToReactorDelivery
                | Self::BiocharDelivery
                | Self::TransportLogistics
                | Self::FieldMobilization
                | Self::FeedstockDeliverySourceToStaging
                | Self::FeedstockDeliveryStagingToField
        )
    }

    /// Stable snake_case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeedstockProvisioning => "feedstock_provisioning",
            Self::FeedstockDelivery => "feedstock_delivery",
            Self::FeedstockToReactorDelivery => "feedstock_to_reactor_delivery",
            Self::Pyrolysis => "pyrolysis",
            Self::BiocharDelivery => "biochar_delivery",
            Self::BiocharApplication => "biochar_application",
            Self::SensorReading => "sensor_reading",
            Self::FarmContract => "farm_contract",
            Self::FarmReport => "farm_report",
            Self::BaselineReport => "baseline_report",
            Self::DeliveryScheduling => "delivery_scheduling",
            Self::BiocharLabTest => "biochar_lab_test",
            Self::BiocharBagging => "biochar_bagging",
            Self::FarmSelection => "farm_selection",
            Self::MonitoringReport => "monitoring_report",
            Self::RockCharacterization => "rock_characterization",
            Self::RockWeighing => "rock_weighing",
            Self::TransportLogistics => "transport_logistics",
            Self::FeedstockIntake => "feedstock_intake",
            Self::BaselineLabPrep => "baseline_lab_prep",
            Self::FieldMobilization => "field_mobilization",
            Self::BaselineEstablishment => "baseline_establishment",
            Self::RockApplication => "rock_application",
            Self::Verification => "verification",
            Self::EnvironmentalMonitoring => "environmental_monitoring",
            Self::NetCdrCalculation => "net_cdr_calculation",
            Self::FeedstockDeliverySourceToStaging => "feedstock_delivery_source_to_staging",
            Self::FeedstockReceivedStaging => "feedstock_received_staging",
            Self::FeedstockDeliveryStagingToField => "feedstock_delivery_staging_to_field",
            Self::FeedstockReceivedField => "feedstock_received_field",
            Self::StakeholderEngagement => "stakeholder_engagement",
            Self::WasteVerification => "waste_verification",
            Self::ReactorDesignValidation => "reactor_design_validation",
            Self::EmissionsMonitoring => "emissions_monitoring",
            Self::SafetyScreening => "safety_screening",
            Self::CarbonStabilityTest => "carbon_stability_test",
            Self::CertifiedWeighIn => "certified_weigh_in",
            Self::ApplicationLossAccounting => "application_loss_accounting",
            Self::NetCreditMinting => "net_credit_minting",
        }
    }

    /// Parses a snake_case wire name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == value)
    }
}

impl Display for EventCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor measurement kinds attached to reading events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    BiocharWeight,
    ReactorTemp,
    ReactorRuntime,
    FinishedBiocharWeight,
    SoilTemp,
    BaselineCarbon,
    CurrentSequestration,
    ReactorFeedstockImage,
    RockWeight,
    SoilPh,
    SoilDic,
    XrfScan,
    Rainfall,
    SoilTempErw,
}

/// Carbon stock split reported by sequestration readings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above_ground_biomass: Option<f64>,
}

/// Supporting evidence references for a reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingEvidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_reading: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub satellite_images: Vec<String>,
}

/// Structured sensor payload.
///
/// `timestamp` is kept verbatim; only the owning event's timestamp drives
/// ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    #[serde(rename = "type")]
    pub kind: SensorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub timestamp: String,
    pub location: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<CarbonBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<ReadingEvidence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Image,
    Document,
}

/// On-chain anchor for an evidence artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainProof {
    pub hash: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ProofKind,
}

/// Feedstock provenance attached to provisioning/delivery events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedstockDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub supplier: String,
    pub volume: f64,
    pub unit: String,
    pub carbon_content: String,
    #[serde(default)]
    pub proofs: Vec<BlockchainProof>,
}

/// Validation errors for lifecycle event records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    EmptyId,
    InvalidTimestamp { id: String, value: String },
    NonFiniteCoordinate { id: String },
    NonFiniteImpact { id: String },
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "event id cannot be empty"),
            Self::InvalidTimestamp { id, value } => {
                write!(f, "event `{id}` has invalid timestamp `{value}`")
            }
            Self::NonFiniteCoordinate { id } => {
                write!(f, "event `{id}` has a non-finite coordinate")
            }
            Self::NonFiniteImpact { id } => write!(f, "event `{id}` has a non-finite co2Impact"),
        }
    }
}

impl Error for EventValidationError {}

/// One immutable, geotagged project lifecycle step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LifecycleEventRecord", into = "LifecycleEventRecord")]
pub struct LifecycleEvent {
    pub id: String,
    pub category: EventCategory,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub coordinate: Coordinate,
    pub location_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Signed kg CO₂e; negative values are emissions.
    pub co2_impact: f64,
    pub sensor_reading: Option<SensorReading>,
    pub feedstock_details: Option<FeedstockDetails>,
    pub blockchain_proofs: Vec<BlockchainProof>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl LifecycleEvent {
    /// Creates an event with empty display fields and no payloads.
    pub fn new(
        id: impl Into<String>,
        category: EventCategory,
        coordinate: Coordinate,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            title: String::new(),
            description: String::new(),
            image_url: String::new(),
            coordinate,
            location_name: None,
            timestamp,
            co2_impact: 0.0,
            sensor_reading: None,
            feedstock_details: None,
            blockchain_proofs: Vec::new(),
            metadata: None,
        }
    }

    /// Validates identity and numeric fields.
    ///
    /// The timestamp is already typed, so it is validated on the raw
    /// record path instead.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.id.trim().is_empty() {
            return Err(EventValidationError::EmptyId);
        }
        if !self.coordinate.is_finite() {
            return Err(EventValidationError::NonFiniteCoordinate {
                id: self.id.clone(),
            });
        }
        if !self.co2_impact.is_finite() {
            return Err(EventValidationError::NonFiniteImpact {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Parses an event timestamp.
///
/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC),
/// or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Wire shape of a lifecycle event (camelCase, string timestamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEventRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub category: EventCategory,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub location: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub co2_impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_reading: Option<SensorReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedstock_details: Option<FeedstockDetails>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockchain_proofs: Vec<BlockchainProof>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl TryFrom<LifecycleEventRecord> for LifecycleEvent {
    type Error = EventValidationError;

    fn try_from(record: LifecycleEventRecord) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            EventValidationError::InvalidTimestamp {
                id: record.id.clone(),
                value: record.timestamp.clone(),
            }
        })?;
        let event = Self {
            id: record.id,
            category: record.category,
            title: record.title,
            description: record.description,
            image_url: record.image_url,
            coordinate: record.location,
            location_name: record.location_name,
            timestamp,
            co2_impact: record.co2_impact,
            sensor_reading: record.sensor_reading,
            feedstock_details: record.feedstock_details,
            blockchain_proofs: record.blockchain_proofs,
            metadata: record.metadata,
        };
        event.validate()?;
        Ok(event)
    }
}

impl From<LifecycleEvent> for LifecycleEventRecord {
    fn from(event: LifecycleEvent) -> Self {
        Self {
            id: event.id,
            category: event.category,
            title: event.title,
            description: event.description,
            image_url: event.image_url,
            location: event.coordinate,
            location_name: event.location_name,
            timestamp: event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            co2_impact: event.co2_impact,
            sensor_reading: event.sensor_reading,
            feedstock_details: event.feedstock_details,
            blockchain_proofs: event.blockchain_proofs,
            metadata: event.metadata,
        }
    }
}
