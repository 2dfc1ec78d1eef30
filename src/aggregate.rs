//! Weighted overall air quality score
//!
//! Six sub-scores are combined with fixed weights and the sum is clamped to
//! 0..100. The clamp is applied once, after weighting; individual sub-scores
//! stay unbounded so a single extreme pollutant still dominates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{AirQualityStatus, ScoreLevel};
use crate::error::{Availability, Result, UnavailableReason};
use crate::pollutant::{PollutantCode, PollutantReadings, normalize};

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Fixed weights, summing to 1.0
pub const POLLUTANT_WEIGHTS: [(PollutantCode, f64); 6] = [
    (PollutantCode::Pm25, 0.25),
    (PollutantCode::Pm10, 0.20),
    (PollutantCode::O3, 0.20),
    (PollutantCode::No2, 0.15),
    (PollutantCode::WildfireIndex, 0.10),
    (PollutantCode::Radon, 0.10),
];

/// Pollutants that must be measured for a score under [`MissingPolicy::Suppress`]
pub const CORE_POLLUTANTS: [PollutantCode; 4] = [
    PollutantCode::Pm25,
    PollutantCode::Pm10,
    PollutantCode::O3,
    PollutantCode::No2,
];

/// What to do when a weighted pollutant was not measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// A missing core pollutant makes the score unavailable. Missing
    /// wildfire or radon indices drop out and the remaining weights are
    /// rescaled to sum to 1.
    #[default]
    Suppress,
    /// Missing terms contribute zero, matching legacy clients
    ZeroFill,
}

#[must_use]
pub fn weight_of(code: PollutantCode) -> Option<f64> {
    POLLUTANT_WEIGHTS
        .iter()
        .find(|&&(candidate, _)| candidate == code)
        .map(|&(_, weight)| weight)
}

fn clamp_score(raw: f64) -> f64 {
    raw.clamp(SCORE_MIN, SCORE_MAX)
}

/// Overall score from all six readings
///
/// # Example
///
/// ```rust
/// use exposure_engine::aggregate::aggregate;
///
/// let score = aggregate(35.0, 150.0, 70.0, 100.0, 0.0, 4.0).unwrap();
/// assert!((score - 90.0).abs() < 1e-9);
/// ```
///
/// # Errors
///
/// * `ScoreError::InvalidConcentration` - any reading is negative, NaN or infinite
pub fn aggregate(
    pm25: f64,
    pm10: f64,
    o3: f64,
    no2: f64,
    wildfire_index: f64,
    radon: f64,
) -> Result<f64> {
    let values = [pm25, pm10, o3, no2, wildfire_index, radon];
    let mut total = 0.0;
    for (&(code, weight), value) in POLLUTANT_WEIGHTS.iter().zip(values) {
        total += weight * normalize(code, value)?;
    }
    Ok(clamp_score(total))
}

/// One weighted term of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub code: PollutantCode,
    pub concentration: f64,
    pub sub_score: f64,
    /// Weight actually applied, after any rescaling
    pub weight: f64,
}

impl Contribution {
    #[must_use]
    pub fn weighted(&self) -> f64 {
        self.sub_score * self.weight
    }
}

/// Scored air quality for one set of readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityScore {
    pub score: f64,
    pub status: AirQualityStatus,
    pub level: ScoreLevel,
    pub contributions: Vec<Contribution>,
    /// Weighted pollutants that were not measured
    pub missing: Vec<PollutantCode>,
}

impl AirQualityScore {
    /// Pollutant with the largest weighted contribution
    #[must_use]
    pub fn dominant_pollutant(&self) -> Option<PollutantCode> {
        self.contributions
            .iter()
            .filter(|c| c.weighted() > 0.0)
            .max_by(|a, b| a.weighted().total_cmp(&b.weighted()))
            .map(|c| c.code)
    }
}

/// Overall score from a reading set, honoring `policy` for absent values
///
/// # Errors
///
/// * `ScoreError::InvalidConcentration` - any stored reading, scored or not, is
///   negative, not finite or off its scale
pub fn score_readings(
    readings: &PollutantReadings,
    policy: MissingPolicy,
) -> Result<Availability<AirQualityScore>> {
    readings.validate()?;
    if readings.is_empty() {
        return Ok(Availability::Unavailable(UnavailableReason::NoMeasurements));
    }

    let missing: Vec<PollutantCode> = POLLUTANT_WEIGHTS
        .iter()
        .map(|&(code, _)| code)
        .filter(|&code| readings.get(code).is_none())
        .collect();

    let missing_core: Vec<PollutantCode> = missing
        .iter()
        .copied()
        .filter(|code| CORE_POLLUTANTS.contains(code))
        .collect();

    if policy == MissingPolicy::Suppress && !missing_core.is_empty() {
        debug!(?missing_core, "suppressing score, core pollutants missing");
        return Ok(Availability::Unavailable(
            UnavailableReason::MissingPollutants(missing_core),
        ));
    }

    let present_weight: f64 = POLLUTANT_WEIGHTS
        .iter()
        .filter(|(code, _)| !missing.contains(code))
        .map(|&(_, weight)| weight)
        .sum();

    let scale = match policy {
        MissingPolicy::Suppress => 1.0 / present_weight,
        MissingPolicy::ZeroFill => 1.0,
    };

    let mut contributions = Vec::with_capacity(POLLUTANT_WEIGHTS.len());
    for &(code, weight) in &POLLUTANT_WEIGHTS {
        if let Some(value) = readings.get(code) {
            contributions.push(Contribution {
                code,
                concentration: value,
                sub_score: normalize(code, value)?,
                weight: weight * scale,
            });
        }
    }

    let raw: f64 = contributions.iter().map(Contribution::weighted).sum();
    let score = clamp_score(raw);
    if (raw - score).abs() > f64::EPSILON {
        debug!(raw, score, "overall score clamped");
    }

    Ok(Availability::Available(AirQualityScore {
        score,
        status: AirQualityStatus::from_score(score),
        level: ScoreLevel::from_score(score),
        contributions,
        missing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreError;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn readings(pairs: &[(PollutantCode, f64)]) -> PollutantReadings {
        let mut readings = PollutantReadings::new();
        for &(code, value) in pairs {
            readings.insert(code, value).unwrap();
        }
        readings
    }

    fn full(pm25: f64, pm10: f64, o3: f64, no2: f64, wildfire: f64, radon: f64) -> PollutantReadings {
        readings(&[
            (PollutantCode::Pm25, pm25),
            (PollutantCode::Pm10, pm10),
            (PollutantCode::O3, o3),
            (PollutantCode::No2, no2),
            (PollutantCode::WildfireIndex, wildfire),
            (PollutantCode::Radon, radon),
        ])
    }

    #[test]
    fn weights_sum_to_one() {
        let sum: f64 = POLLUTANT_WEIGHTS.iter().map(|&(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_at_standard_scores_ninety() {
        let score = aggregate(35.0, 150.0, 70.0, 100.0, 0.0, 4.0).unwrap();
        assert!((score - 90.0).abs() < EPS);
        assert_eq!(AirQualityStatus::from_score(score), AirQualityStatus::Avoid);
    }

    #[test]
    fn clean_air_scores_low() {
        let score = aggregate(5.0, 20.0, 10.0, 5.0, 0.0, 0.5).unwrap();
        assert!((score - 11.095_238_095_238_095).abs() < 1e-6, "got {score}");
        assert_eq!(AirQualityStatus::from_score(score), AirQualityStatus::Good);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)]
    #[case(70.0, 150.0, 70.0, 100.0, 0.0, 4.0, 100.0)] // pre-clamp 115
    #[case(1_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0)] // single extreme dominates
    #[case(0.0, 0.0, 0.0, 0.0, 100.0, 0.0, 10.0)]
    #[case(0.0, 0.0, 0.0, 0.0, 0.0, 40.0, 100.0)] // radon at 10x standard
    fn aggregate_is_clamped(
        #[case] pm25: f64,
        #[case] pm10: f64,
        #[case] o3: f64,
        #[case] no2: f64,
        #[case] wildfire: f64,
        #[case] radon: f64,
        #[case] expected: f64,
    ) {
        let score = aggregate(pm25, pm10, o3, no2, wildfire, radon).unwrap();
        assert!((score - expected).abs() < EPS, "got {score}");
        assert!((SCORE_MIN..=SCORE_MAX).contains(&score));
    }

    #[test]
    fn clamp_holds_over_a_grid() {
        let steps = [0.0, 1.0, 17.5, 35.0, 120.0, 999.0];
        for &a in &steps {
            for &b in &steps {
                let score = aggregate(a, b * 4.0, b * 2.0, a * 3.0, b.min(100.0), a / 10.0).unwrap();
                assert!((SCORE_MIN..=SCORE_MAX).contains(&score), "{a}/{b} -> {score}");
            }
        }
    }

    #[test]
    fn aggregate_rejects_negative() {
        assert!(matches!(
            aggregate(10.0, 10.0, -1.0, 10.0, 0.0, 0.0),
            Err(ScoreError::InvalidConcentration {
                code: PollutantCode::O3,
                ..
            })
        ));
    }

    #[test]
    fn readings_match_positional_aggregate() {
        let scored = score_readings(&full(5.0, 20.0, 10.0, 5.0, 0.0, 0.5), MissingPolicy::Suppress)
            .unwrap()
            .available()
            .unwrap();
        let direct = aggregate(5.0, 20.0, 10.0, 5.0, 0.0, 0.5).unwrap();
        assert!((scored.score - direct).abs() < EPS);
        assert!(scored.missing.is_empty());
        assert_eq!(scored.status, AirQualityStatus::Good);
        assert_eq!(scored.level, ScoreLevel::Excellent);
        assert_eq!(scored.dominant_pollutant(), Some(PollutantCode::Pm25));
    }

    #[test]
    fn missing_core_pollutant_suppresses_score() {
        let partial = readings(&[
            (PollutantCode::Pm25, 12.0),
            (PollutantCode::O3, 30.0),
            (PollutantCode::WildfireIndex, 5.0),
        ]);
        let result = score_readings(&partial, MissingPolicy::Suppress).unwrap();
        assert_eq!(
            result,
            Availability::Unavailable(UnavailableReason::MissingPollutants(vec![
                PollutantCode::Pm10,
                PollutantCode::No2,
            ]))
        );
    }

    #[test]
    fn missing_core_pollutant_zero_fills_when_asked() {
        let partial = readings(&[(PollutantCode::Pm25, 35.0), (PollutantCode::O3, 70.0)]);
        let scored = score_readings(&partial, MissingPolicy::ZeroFill)
            .unwrap()
            .available()
            .unwrap();
        // 0.25 * 100 + 0.20 * 100, everything else zero
        assert!((scored.score - 45.0).abs() < EPS);
        assert_eq!(
            scored.missing,
            vec![
                PollutantCode::Pm10,
                PollutantCode::No2,
                PollutantCode::WildfireIndex,
                PollutantCode::Radon,
            ]
        );
    }

    #[test]
    fn missing_optional_indices_rescale_weights() {
        let core_only = readings(&[
            (PollutantCode::Pm25, 35.0),
            (PollutantCode::Pm10, 150.0),
            (PollutantCode::O3, 70.0),
            (PollutantCode::No2, 100.0),
        ]);
        let scored = score_readings(&core_only, MissingPolicy::Suppress)
            .unwrap()
            .available()
            .unwrap();
        // every present sub-score is 100, so the rescaled mean is 100
        assert!((scored.score - 100.0).abs() < EPS);
        let applied: f64 = scored.contributions.iter().map(|c| c.weight).sum();
        assert!((applied - 1.0).abs() < EPS);

        let zero_filled = score_readings(&core_only, MissingPolicy::ZeroFill)
            .unwrap()
            .available()
            .unwrap();
        assert!((zero_filled.score - 80.0).abs() < EPS);
    }

    #[test]
    fn empty_readings_are_unavailable() {
        for policy in [MissingPolicy::Suppress, MissingPolicy::ZeroFill] {
            assert_eq!(
                score_readings(&PollutantReadings::new(), policy).unwrap(),
                Availability::Unavailable(UnavailableReason::NoMeasurements)
            );
        }
    }

    #[test]
    fn unweighted_readings_are_ignored() {
        let mut with_extras = full(5.0, 20.0, 10.0, 5.0, 0.0, 0.5);
        with_extras.insert(PollutantCode::Co, 9.0).unwrap();
        with_extras.insert(PollutantCode::UniversalAqi, 250.0).unwrap();
        let scored = score_readings(&with_extras, MissingPolicy::Suppress)
            .unwrap()
            .available()
            .unwrap();
        assert_eq!(scored.contributions.len(), 6);
    }

    #[rstest]
    #[case(r#"{"pm25": 5, "pm10": 20, "o3": 10, "no2": 5, "co": -3}"#, PollutantCode::Co)]
    #[case(r#"{"pm25": 5, "no2": 5, "universalAqi": 900}"#, PollutantCode::UniversalAqi)]
    #[case(r#"{"pm25": -5, "pm10": 20, "o3": 10, "no2": 5}"#, PollutantCode::Pm25)]
    fn deserialized_invalid_readings_are_rejected(
        #[case] json: &str,
        #[case] bad: PollutantCode,
    ) {
        let readings: PollutantReadings = serde_json::from_str(json).unwrap();
        for policy in [MissingPolicy::Suppress, MissingPolicy::ZeroFill] {
            assert!(matches!(
                score_readings(&readings, policy),
                Err(ScoreError::InvalidConcentration { code, .. }) if code == bad
            ));
        }
    }

    #[test]
    fn dominant_pollutant_none_when_all_zero() {
        let scored = score_readings(&full(0.0, 0.0, 0.0, 0.0, 0.0, 0.0), MissingPolicy::Suppress)
            .unwrap()
            .available()
            .unwrap();
        assert_eq!(scored.dominant_pollutant(), None);
        assert_eq!(weight_of(PollutantCode::Radon), Some(0.10));
        assert_eq!(weight_of(PollutantCode::Co), None);
    }
}
