//! Environmental Exposure Scoring
//!
//! This crate turns raw environmental readings into scores and advice:
//! - pollutant sub-scores and a weighted, clamped overall score
//! - three-level status and five-level score bands
//! - a personal risk multiplier from a health profile
//! - distance-weighted route exposure with per-segment pace
//! - Web Mercator tile bounds for overlay pre-filtering
//!
//! Everything here is a pure function over its inputs. Fetching readings and
//! tiles, retries and persistence belong to the caller.
//!
//! # Example
//!
//! ```rust
//! use exposure_engine::{assess, HealthProfile, PollutantCode, PollutantReadings, ScoringConfig};
//! use exposure_engine::risk::Condition;
//!
//! let readings = PollutantReadings::new()
//!     .with(PollutantCode::Pm25, 5.0)?
//!     .with(PollutantCode::Pm10, 20.0)?
//!     .with(PollutantCode::O3, 10.0)?
//!     .with(PollutantCode::No2, 5.0)?;
//! let profile = HealthProfile::default().with_condition(Condition::Asthma);
//!
//! let assessment = assess(&readings, &profile, &ScoringConfig::default())?
//!     .available()
//!     .expect("all core pollutants present");
//! println!("{} ({})", assessment.air_quality.status, assessment.strength);
//! # Ok::<(), exposure_engine::ScoreError>(())
//! ```

pub mod advice;
pub mod aggregate;
pub mod aqi;
pub mod classify;
pub mod config;
pub mod environment;
pub mod error;
pub mod measurement;
pub mod pollutant;
pub mod risk;
pub mod route;
pub mod tile;

use serde::{Deserialize, Serialize};

pub use advice::RecommendationStrength;
pub use aggregate::{AirQualityScore, MissingPolicy, aggregate};
pub use classify::{AirQualityStatus, ScoreLevel};
pub use config::ScoringConfig;
pub use environment::{Domain, DomainScore, DomainWeights, OverallEnvironmentalScore};
pub use error::{Availability, Result, ScoreError, UnavailableReason};
pub use pollutant::{PollutantCode, PollutantReading, PollutantReadings, normalize};
pub use risk::{HealthProfile, compute_risk_multiplier};
pub use route::{Pace, Route, RouteExposure, RouteSegment, score as score_route};
pub use tile::{TileBounds, TileFilter, intersects, tile_to_lat_lng_bounds};

/// Scored readings personalized for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub air_quality: AirQualityScore,
    pub risk_multiplier: f64,
    pub personalized_score: f64,
    pub strength: RecommendationStrength,
    /// Provider index, passed through unmodified
    pub universal_aqi: Option<f64>,
}

/// Main entry point: readings and a health profile to personalized advice
///
/// # Errors
///
/// * `ScoreError::InvalidConcentration` - a reading is negative, not finite or off its scale
/// * `ScoreError::InvalidSensitivity` - profile sensitivity outside 1..=10
pub fn assess(
    readings: &PollutantReadings,
    profile: &HealthProfile,
    config: &ScoringConfig,
) -> Result<Availability<Assessment>> {
    readings.validate()?;
    let risk_multiplier = compute_risk_multiplier(profile)?;
    let scored = match aggregate::score_readings(readings, config.missing_policy)? {
        Availability::Available(scored) => scored,
        Availability::Unavailable(reason) => return Ok(Availability::Unavailable(reason)),
    };

    let personalized_score = advice::personalized_score(scored.score, risk_multiplier)?;
    let strength = advice::recommendation_strength(scored.score, risk_multiplier)?;

    Ok(Availability::Available(Assessment {
        air_quality: scored,
        risk_multiplier,
        personalized_score,
        strength,
        universal_aqi: readings.universal_aqi(),
    }))
}
