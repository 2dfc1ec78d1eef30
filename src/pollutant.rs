//! Pollutant vocabulary and sub-score normalization
//!
//! A sub-score is the reading expressed as a percentage of its reference
//! standard. Sub-scores are not clamped: a reading at twice the standard
//! scores 200 and keeps that weight until the aggregate is bounded.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoreError};

/// Closed vocabulary of reading codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PollutantCode {
    Pm25,
    Pm10,
    O3,
    No2,
    Co,
    So2,
    Nox,
    No,
    Nh3,
    C6h6,
    Ox,
    Nmhc,
    Trs,
    /// Wildfire smoke index, already 0..100
    WildfireIndex,
    /// Indoor radon in pCi/L
    Radon,
    /// Provider supplied 0..500 index, passed through untouched
    UniversalAqi,
}

/// Measurement unit implied by a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    MicrogramsPerCubicMeter,
    PartsPerBillion,
    PartsPerMillion,
    PicocuriesPerLiter,
    Index,
}

impl PollutantCode {
    pub const ALL: [Self; 16] = [
        Self::Pm25,
        Self::Pm10,
        Self::O3,
        Self::No2,
        Self::Co,
        Self::So2,
        Self::Nox,
        Self::No,
        Self::Nh3,
        Self::C6h6,
        Self::Ox,
        Self::Nmhc,
        Self::Trs,
        Self::WildfireIndex,
        Self::Radon,
        Self::UniversalAqi,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pm25 => "pm25",
            Self::Pm10 => "pm10",
            Self::O3 => "o3",
            Self::No2 => "no2",
            Self::Co => "co",
            Self::So2 => "so2",
            Self::Nox => "nox",
            Self::No => "no",
            Self::Nh3 => "nh3",
            Self::C6h6 => "c6h6",
            Self::Ox => "ox",
            Self::Nmhc => "nmhc",
            Self::Trs => "trs",
            Self::WildfireIndex => "wildfireIndex",
            Self::Radon => "radon",
            Self::UniversalAqi => "universalAqi",
        }
    }

    /// Parse a provider code, case-insensitive, tolerating `pm2_5` style spellings
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_lowercase().replace(['_', '.'], "");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().to_ascii_lowercase() == normalized)
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        match self {
            Self::Pm25 | Self::Pm10 => Unit::MicrogramsPerCubicMeter,
            Self::O3
            | Self::No2
            | Self::So2
            | Self::Nox
            | Self::No
            | Self::Nh3
            | Self::C6h6
            | Self::Ox
            | Self::Nmhc
            | Self::Trs => Unit::PartsPerBillion,
            Self::Co => Unit::PartsPerMillion,
            Self::Radon => Unit::PicocuriesPerLiter,
            Self::WildfireIndex | Self::UniversalAqi => Unit::Index,
        }
    }

    /// Reading that scores exactly 100, for the six scored inputs
    #[must_use]
    pub fn reference_standard(&self) -> Option<f64> {
        match self {
            Self::Pm25 => Some(35.0),
            Self::Pm10 => Some(150.0),
            Self::O3 => Some(70.0),
            Self::No2 => Some(100.0),
            Self::WildfireIndex => Some(100.0),
            Self::Radon => Some(4.0),
            Self::Co
            | Self::So2
            | Self::Nox
            | Self::No
            | Self::Nh3
            | Self::C6h6
            | Self::Ox
            | Self::Nmhc
            | Self::Trs
            | Self::UniversalAqi => None,
        }
    }

    /// Top of the scale for index codes; concentrations have no upper limit
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        match self {
            Self::WildfireIndex => Some(100.0),
            Self::UniversalAqi => Some(500.0),
            _ => None,
        }
    }
}

impl fmt::Display for PollutantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject concentrations that are negative, not finite or above the code's scale
///
/// # Errors
///
/// * `ScoreError::InvalidConcentration` - value is negative, NaN, infinite, or
///   above 100 for `wildfireIndex` / 500 for `universalAqi`
pub fn validate_concentration(code: PollutantCode, concentration: f64) -> Result<f64> {
    let in_scale = code.max_value().is_none_or(|max| concentration <= max);
    if concentration.is_finite() && concentration >= 0.0 && in_scale {
        Ok(concentration)
    } else {
        debug!(%code, concentration, "rejecting concentration");
        Err(ScoreError::invalid_concentration(code, concentration))
    }
}

/// Convert a raw reading into its unclamped 0..100+ sub-score
///
/// # Example
///
/// ```rust
/// use exposure_engine::pollutant::{normalize, PollutantCode};
///
/// assert_eq!(normalize(PollutantCode::Pm25, 35.0).unwrap(), 100.0);
/// assert_eq!(normalize(PollutantCode::Radon, 8.0).unwrap(), 200.0);
/// ```
///
/// # Errors
///
/// * `ScoreError::InvalidConcentration` - value is negative, NaN or infinite
/// * `ScoreError::UnsupportedPollutant` - code has no reference standard
pub fn normalize(code: PollutantCode, concentration: f64) -> Result<f64> {
    let concentration = validate_concentration(code, concentration)?;
    let standard = code
        .reference_standard()
        .ok_or(ScoreError::UnsupportedPollutant(code))?;
    Ok(concentration / standard * 100.0)
}

/// A single reading; `None` means the pollutant was not measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub code: PollutantCode,
    pub concentration: Option<f64>,
}

impl PollutantReading {
    #[must_use]
    pub fn new(code: PollutantCode, concentration: Option<f64>) -> Self {
        Self {
            code,
            concentration,
        }
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.code.unit()
    }

    /// Sub-score for this reading, `None` when not measured
    ///
    /// # Errors
    ///
    /// See [`normalize`].
    pub fn sub_score(&self) -> Result<Option<f64>> {
        self.concentration
            .map(|value| normalize(self.code, value))
            .transpose()
    }
}

/// Set of readings for one place and time
///
/// Only measured pollutants are present; absence is never stored as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollutantReadings {
    values: BTreeMap<PollutantCode, f64>,
}

impl PollutantReadings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::insert`]
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidConcentration` - value is negative, NaN or infinite
    pub fn with(mut self, code: PollutantCode, concentration: f64) -> Result<Self> {
        self.insert(code, concentration)?;
        Ok(self)
    }

    /// Record a measured value, replacing any previous one
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidConcentration` - value is negative, NaN or infinite
    pub fn insert(&mut self, code: PollutantCode, concentration: f64) -> Result<()> {
        let value = validate_concentration(code, concentration)?;
        self.values.insert(code, value);
        Ok(())
    }

    /// Record an optional value; `None` clears the pollutant
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidConcentration` - value is negative, NaN or infinite
    pub fn set(&mut self, code: PollutantCode, concentration: Option<f64>) -> Result<()> {
        match concentration {
            Some(value) => self.insert(code, value),
            None => {
                self.values.remove(&code);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, code: PollutantCode) -> Option<f64> {
        self.values.get(&code).copied()
    }

    #[must_use]
    pub fn reading(&self, code: PollutantCode) -> PollutantReading {
        PollutantReading::new(code, self.get(code))
    }

    /// Provider index, passed through unmodified
    #[must_use]
    pub fn universal_aqi(&self) -> Option<f64> {
        self.get(PollutantCode::UniversalAqi)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PollutantReading> + '_ {
        self.values
            .iter()
            .map(|(&code, &value)| PollutantReading::new(code, Some(value)))
    }

    /// Re-check every stored value, for instances built by deserialization
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidConcentration` - first offending value
    pub fn validate(&self) -> Result<()> {
        for (&code, &value) in &self.values {
            validate_concentration(code, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    #[rstest]
    #[case(PollutantCode::Pm25, 35.0, 100.0)]
    #[case(PollutantCode::Pm25, 70.0, 200.0)]
    #[case(PollutantCode::Pm10, 150.0, 100.0)]
    #[case(PollutantCode::Pm10, 20.0, 13.333333333333334)]
    #[case(PollutantCode::O3, 70.0, 100.0)]
    #[case(PollutantCode::No2, 5.0, 5.0)]
    #[case(PollutantCode::WildfireIndex, 42.0, 42.0)]
    #[case(PollutantCode::Radon, 4.0, 100.0)]
    #[case(PollutantCode::Radon, 0.0, 0.0)]
    fn normalize_cases(#[case] code: PollutantCode, #[case] value: f64, #[case] expected: f64) {
        let got = normalize(code, value).unwrap();
        assert!(
            (got - expected).abs() < EPS,
            "normalize({code}, {value}) = {got}, expected {expected}"
        );
    }

    #[test]
    fn sub_scores_are_not_clamped() {
        assert!((normalize(PollutantCode::Pm25, 350.0).unwrap() - 1000.0).abs() < EPS);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn normalize_rejects_invalid(#[case] value: f64) {
        assert!(matches!(
            normalize(PollutantCode::O3, value),
            Err(ScoreError::InvalidConcentration {
                code: PollutantCode::O3,
                ..
            })
        ));
    }

    #[test]
    fn normalize_rejects_unscored_codes() {
        assert_eq!(
            normalize(PollutantCode::Co, 1.0),
            Err(ScoreError::UnsupportedPollutant(PollutantCode::Co))
        );
        assert_eq!(
            normalize(PollutantCode::UniversalAqi, 80.0),
            Err(ScoreError::UnsupportedPollutant(PollutantCode::UniversalAqi))
        );
    }

    #[rstest]
    #[case("pm25", Some(PollutantCode::Pm25))]
    #[case("PM2_5", Some(PollutantCode::Pm25))]
    #[case("pm2.5", Some(PollutantCode::Pm25))]
    #[case("wildfire_index", Some(PollutantCode::WildfireIndex))]
    #[case("universalAqi", Some(PollutantCode::UniversalAqi))]
    #[case("c6h6", Some(PollutantCode::C6h6))]
    #[case("pollen", None)]
    fn from_code_cases(#[case] input: &str, #[case] expected: Option<PollutantCode>) {
        assert_eq!(PollutantCode::from_code(input), expected);
    }

    #[test]
    fn serde_names_match_display() {
        for code in PollutantCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn readings_keep_absence_distinct_from_zero() {
        let mut readings = PollutantReadings::new()
            .with(PollutantCode::Pm25, 0.0)
            .unwrap();
        assert_eq!(readings.get(PollutantCode::Pm25), Some(0.0));
        assert_eq!(readings.get(PollutantCode::Pm10), None);
        assert_eq!(readings.reading(PollutantCode::Pm10).sub_score(), Ok(None));

        readings.set(PollutantCode::Pm25, None).unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn readings_reject_invalid_values() {
        let mut readings = PollutantReadings::new();
        assert!(readings.insert(PollutantCode::No2, -5.0).is_err());
        assert!(readings.is_empty());
    }

    #[test]
    fn deserialized_readings_can_be_validated() {
        let readings: PollutantReadings =
            serde_json::from_str(r#"{"pm25": 12.0, "radon": -1.0}"#).unwrap();
        assert_eq!(readings.len(), 2);
        assert!(matches!(
            readings.validate(),
            Err(ScoreError::InvalidConcentration {
                code: PollutantCode::Radon,
                ..
            })
        ));
    }

    #[rstest]
    #[case(PollutantCode::WildfireIndex, 100.0, true)]
    #[case(PollutantCode::WildfireIndex, 100.5, false)]
    #[case(PollutantCode::WildfireIndex, 250.0, false)]
    #[case(PollutantCode::UniversalAqi, 500.0, true)]
    #[case(PollutantCode::UniversalAqi, 9000.0, false)]
    #[case(PollutantCode::Pm25, 9000.0, true)]
    fn index_codes_stay_on_their_scale(
        #[case] code: PollutantCode,
        #[case] value: f64,
        #[case] accepted: bool,
    ) {
        let mut readings = PollutantReadings::new();
        assert_eq!(readings.insert(code, value).is_ok(), accepted, "{code} = {value}");
        assert_eq!(readings.get(code).is_some(), accepted);
    }

    #[test]
    fn universal_aqi_passes_through() {
        let readings = PollutantReadings::new()
            .with(PollutantCode::UniversalAqi, 312.0)
            .unwrap();
        assert_eq!(readings.universal_aqi(), Some(312.0));
    }
}
