//! Combining per-domain scores into one environmental score

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{self, AirQualityScore, MissingPolicy, SCORE_MAX, SCORE_MIN};
use crate::classify::ScoreLevel;
use crate::error::{Availability, Result, ScoreError, UnavailableReason};
use crate::pollutant::{PollutantReading, PollutantReadings};

/// Environmental domain a score describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    AirQuality,
    IndoorEnvironment,
    Aeroallergens,
    Meteorology,
    Wildfire,
}

impl Domain {
    pub const ALL: [Self; 5] = [
        Self::AirQuality,
        Self::IndoorEnvironment,
        Self::Aeroallergens,
        Self::Meteorology,
        Self::Wildfire,
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AirQuality => "Air quality",
            Self::IndoorEnvironment => "Indoor environment",
            Self::Aeroallergens => "Pollen and allergens",
            Self::Meteorology => "Weather",
            Self::Wildfire => "Wildfire smoke",
        }
    }

    /// Advice shown when this domain is a concern
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::AirQuality => "Limit time near heavy traffic and consider a mask outdoors",
            Self::IndoorEnvironment => "Ventilate indoor spaces and test for radon",
            Self::Aeroallergens => "Take allergy medication before going out",
            Self::Meteorology => "Dress for the weather and stay hydrated",
            Self::Wildfire => "Stay indoors with filtered air while smoke persists",
        }
    }

    /// Whether outdoor air entering through windows is affected
    #[must_use]
    pub fn affects_outdoor_air(&self) -> bool {
        match self {
            Self::AirQuality | Self::Aeroallergens | Self::Wildfire => true,
            Self::IndoorEnvironment | Self::Meteorology => false,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn check_score(score: f64) -> Result<f64> {
    if score.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(&score) {
        Ok(score)
    } else {
        Err(ScoreError::invalid_field("domain score", score))
    }
}

/// Score for one domain, already on the 0..100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: Domain,
    pub score: f64,
    pub level: ScoreLevel,
    pub primary_concern: String,
    pub contributing_readings: Vec<PollutantReading>,
}

impl DomainScore {
    /// # Errors
    ///
    /// * `ScoreError::InvalidReading` - score is not finite or outside 0..100
    pub fn new(
        domain: Domain,
        score: f64,
        primary_concern: impl Into<String>,
        contributing_readings: Vec<PollutantReading>,
    ) -> Result<Self> {
        let score = check_score(score)?;
        Ok(Self {
            domain,
            score,
            level: ScoreLevel::from_score(score),
            primary_concern: primary_concern.into(),
            contributing_readings,
        })
    }
}

impl From<&AirQualityScore> for DomainScore {
    fn from(scored: &AirQualityScore) -> Self {
        let primary_concern = scored
            .dominant_pollutant()
            .map_or_else(|| "None".to_string(), |code| code.to_string());
        let contributing_readings = scored
            .contributions
            .iter()
            .map(|c| PollutantReading::new(c.code, Some(c.concentration)))
            .collect();
        Self {
            domain: Domain::AirQuality,
            score: scored.score,
            level: scored.level,
            primary_concern,
            contributing_readings,
        }
    }
}

/// Air quality domain score straight from raw readings
///
/// # Errors
///
/// * `ScoreError::InvalidConcentration` - a stored reading is negative, NaN or infinite
pub fn air_quality_domain(
    readings: &PollutantReadings,
    policy: MissingPolicy,
) -> Result<Availability<DomainScore>> {
    Ok(aggregate::score_readings(readings, policy)?.map(|scored| DomainScore::from(&scored)))
}

/// Relative weight per domain; domains absent from the table are ignored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainWeights(BTreeMap<Domain, f64>);

impl Default for DomainWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Domain::AirQuality, 0.35),
            (Domain::Wildfire, 0.20),
            (Domain::Aeroallergens, 0.20),
            (Domain::IndoorEnvironment, 0.15),
            (Domain::Meteorology, 0.10),
        ]))
    }
}

impl DomainWeights {
    /// # Errors
    ///
    /// * `ScoreError::InvalidWeights` - see [`Self::validate`]
    pub fn new(weights: impl IntoIterator<Item = (Domain, f64)>) -> Result<Self> {
        let table = Self(weights.into_iter().collect());
        table.validate()?;
        Ok(table)
    }

    #[must_use]
    pub fn get(&self, domain: Domain) -> Option<f64> {
        self.0.get(&domain).copied()
    }

    /// Weights must be finite, non-negative and not all zero
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidWeights` - first offending entry
    pub fn validate(&self) -> Result<()> {
        for (domain, &weight) in &self.0 {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoreError::InvalidWeights(format!(
                    "{domain} weight {weight}"
                )));
            }
        }
        if self.0.values().sum::<f64>() <= 0.0 {
            return Err(ScoreError::InvalidWeights("weights sum to zero".into()));
        }
        Ok(())
    }
}

/// Combined score across every available domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallEnvironmentalScore {
    pub score: f64,
    pub level: ScoreLevel,
    pub primary_concerns: Vec<String>,
    pub recommendations: Vec<String>,
    pub safe_for_outdoor_activity: bool,
    pub safe_for_exercise: bool,
    /// Opening windows is advisable
    pub windows_recommendation: bool,
}

fn general_recommendation(level: ScoreLevel) -> &'static str {
    match level {
        ScoreLevel::Excellent => "Great day to spend time outdoors",
        ScoreLevel::Good => "Conditions are fine for most outdoor plans",
        ScoreLevel::Moderate => "Sensitive groups should shorten strenuous outdoor activity",
        ScoreLevel::Poor => "Move strenuous activity indoors",
        ScoreLevel::Hazardous => "Stay indoors and keep windows closed",
    }
}

/// Weighted mean of the domain scores, clamped to 0..100
///
/// Concerns are domains scoring worse than `Good`, most severe first. Levels
/// are re-derived from each score; a stored `level` is not trusted.
///
/// # Errors
///
/// * `ScoreError::InvalidWeights` - weight table fails validation
/// * `ScoreError::InvalidReading` - a domain appears twice or has an out-of-range score
pub fn combine_domains(
    scores: &[DomainScore],
    weights: &DomainWeights,
) -> Result<Availability<OverallEnvironmentalScore>> {
    weights.validate()?;

    let mut seen = BTreeSet::new();
    for domain_score in scores {
        if !seen.insert(domain_score.domain) {
            return Err(ScoreError::InvalidReading(format!(
                "duplicate {} score",
                domain_score.domain
            )));
        }
        check_score(domain_score.score)?;
    }

    let weighted: Vec<(&DomainScore, f64)> = scores
        .iter()
        .filter_map(|s| weights.get(s.domain).map(|w| (s, w)))
        .filter(|&(_, w)| w > 0.0)
        .collect();

    let total_weight: f64 = weighted.iter().map(|&(_, w)| w).sum();
    if weighted.is_empty() || total_weight <= 0.0 {
        debug!(domains = scores.len(), "no weighted domain scores");
        return Ok(Availability::Unavailable(UnavailableReason::NoDomainScores));
    }

    let raw = weighted.iter().map(|&(s, w)| s.score * w).sum::<f64>() / total_weight;
    let score = raw.clamp(SCORE_MIN, SCORE_MAX);
    let level = ScoreLevel::from_score(score);

    let mut concerning: Vec<&DomainScore> = weighted
        .iter()
        .map(|&(s, _)| s)
        .filter(|s| ScoreLevel::from_score(s.score) > ScoreLevel::Good)
        .collect();
    concerning.sort_by(|a, b| b.score.total_cmp(&a.score));

    let primary_concerns = concerning
        .iter()
        .map(|s| s.primary_concern.clone())
        .collect();

    let mut recommendations = vec![general_recommendation(level).to_string()];
    recommendations.extend(concerning.iter().map(|s| s.domain.advice().to_string()));

    let worst_domain = weighted
        .iter()
        .map(|&(s, _)| ScoreLevel::from_score(s.score))
        .max()
        .unwrap_or(ScoreLevel::Excellent);
    let outdoor_air_clean = weighted
        .iter()
        .filter(|&&(s, _)| s.domain.affects_outdoor_air())
        .all(|&(s, _)| ScoreLevel::from_score(s.score) <= ScoreLevel::Good);

    Ok(Availability::Available(OverallEnvironmentalScore {
        score,
        level,
        primary_concerns,
        recommendations,
        safe_for_outdoor_activity: level <= ScoreLevel::Moderate
            && worst_domain < ScoreLevel::Hazardous,
        safe_for_exercise: level <= ScoreLevel::Good && worst_domain <= ScoreLevel::Moderate,
        windows_recommendation: level <= ScoreLevel::Good && outdoor_air_clean,
    }))
}
