//! Threshold classification of scores into ordered levels
//!
//! Both tables treat lower scores as better. Each band includes its upper
//! bound, so `50.0` is still `Good` and `50.0001` is `Caution`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered bands; the last entry catches everything above the final bound
#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable<L: 'static> {
    bands: &'static [(f64, L)],
    worst: L,
}

impl<L: Copy + 'static> ThresholdTable<L> {
    /// Build a table from ascending inclusive upper bounds
    #[must_use]
    pub const fn new(bands: &'static [(f64, L)], worst: L) -> Self {
        Self { bands, worst }
    }

    /// Upper bounds in ascending order
    pub fn bounds(&self) -> impl Iterator<Item = f64> + '_ {
        self.bands.iter().map(|&(bound, _)| bound)
    }

    #[must_use]
    pub fn worst(&self) -> L {
        self.worst
    }

    /// Total over every `f64`; NaN falls through to the worst level
    #[must_use]
    pub fn classify(&self, score: f64) -> L {
        self.bands
            .iter()
            .find(|&&(bound, _)| score <= bound)
            .map_or(self.worst, |&(_, level)| level)
    }
}

/// Three-level air quality status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityStatus {
    Good,
    Caution,
    Avoid,
}

pub const AIR_QUALITY_STATUS: ThresholdTable<AirQualityStatus> = ThresholdTable::new(
    &[(50.0, AirQualityStatus::Good), (75.0, AirQualityStatus::Caution)],
    AirQualityStatus::Avoid,
);

impl AirQualityStatus {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        AIR_QUALITY_STATUS.classify(score)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Caution => "Caution",
            Self::Avoid => "Avoid",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Good => "Air quality is good for outdoor activities",
            Self::Caution => "Sensitive groups should limit prolonged outdoor exertion",
            Self::Avoid => "Avoid outdoor activities",
        }
    }

    /// Hex color used by map pins and badges
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Good => "#4CAF50",
            Self::Caution => "#FF9800",
            Self::Avoid => "#F44336",
        }
    }
}

impl fmt::Display for AirQualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Five-level environmental score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
    Hazardous,
}

pub const SCORE_LEVEL: ThresholdTable<ScoreLevel> = ThresholdTable::new(
    &[
        (20.0, ScoreLevel::Excellent),
        (40.0, ScoreLevel::Good),
        (60.0, ScoreLevel::Moderate),
        (80.0, ScoreLevel::Poor),
    ],
    ScoreLevel::Hazardous,
);

impl ScoreLevel {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        SCORE_LEVEL.classify(score)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::Hazardous => "Hazardous",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Conditions are ideal",
            Self::Good => "Conditions are acceptable for nearly everyone",
            Self::Moderate => "Unusually sensitive people may notice effects",
            Self::Poor => "Everyone may begin to experience effects",
            Self::Hazardous => "Health warnings apply to everyone",
        }
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "#00C853",
            Self::Good => "#64DD17",
            Self::Moderate => "#FFD600",
            Self::Poor => "#FF6D00",
            Self::Hazardous => "#D50000",
        }
    }
}

impl fmt::Display for ScoreLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
