//! Error and availability types for the scoring engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pollutant::PollutantCode;

/// Result type alias for scoring operations
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Caller errors: inputs that can never produce a meaningful score.
///
/// Absent data is not an error, see [`Availability`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Negative, NaN or infinite concentration
    #[error("Invalid {code} concentration: {value}")]
    InvalidConcentration { code: PollutantCode, value: f64 },

    /// Pollutant has no reference standard
    #[error("Pollutant {0} is not scored")]
    UnsupportedPollutant(PollutantCode),

    /// Sensitivity level outside 1..=10
    #[error("Invalid sensitivity level: {0} (expected 1..=10)")]
    InvalidSensitivity(u8),

    /// Tile coordinate outside the grid for its zoom
    #[error("Invalid tile {x}/{y} at zoom {zoom}")]
    InvalidTile { x: u32, y: u32, zoom: u8 },

    /// Latitude or longitude out of range or not finite
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Malformed route or forecast reading
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Weight table that cannot be applied
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// Configuration document that failed to parse
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ScoreError {
    /// Create a new `InvalidConcentration` error
    #[must_use]
    pub fn invalid_concentration(code: PollutantCode, value: f64) -> Self {
        Self::InvalidConcentration { code, value }
    }

    /// Create a new `InvalidTile` error
    #[must_use]
    pub fn invalid_tile(x: u32, y: u32, zoom: u8) -> Self {
        Self::InvalidTile { x, y, zoom }
    }

    /// Create a new `InvalidReading` error for a specific field
    #[must_use]
    pub fn invalid_field(field: &str, value: f64) -> Self {
        Self::InvalidReading(format!("Invalid {field} value: {value}"))
    }
}

/// Why a computation produced no result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Required pollutants were not measured
    MissingPollutants(Vec<PollutantCode>),
    /// Route has no segments
    NoSegments,
    /// No domain produced a score
    NoDomainScores,
    /// No source reported anything
    NoMeasurements,
    /// Neither AQI nor PM2.5 was available at this segment's midpoint
    UnsampledSegment(usize),
}

/// Either a computed value or a typed "no data" outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Availability<T> {
    Available(T),
    Unavailable(UnavailableReason),
}

impl<T> Availability<T> {
    /// Value if available
    #[must_use]
    pub fn available(self) -> Option<T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Reason if unavailable
    #[must_use]
    pub fn reason(&self) -> Option<&UnavailableReason> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(reason) => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Availability<U> {
        match self {
            Self::Available(value) => Availability::Available(f(value)),
            Self::Unavailable(reason) => Availability::Unavailable(reason),
        }
    }
}
