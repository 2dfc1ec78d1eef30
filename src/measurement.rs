//! Combining readings for one place reported by several sources

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Availability, Result, ScoreError, UnavailableReason};
use crate::pollutant::{PollutantCode, PollutantReadings};

/// Readings from one provider with its confidence in (0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMeasurement {
    pub source: String,
    pub readings: PollutantReadings,
    pub confidence: f64,
}

impl SourceMeasurement {
    /// # Errors
    ///
    /// * `ScoreError::InvalidReading` - confidence not finite or outside (0, 1]
    pub fn new(
        source: impl Into<String>,
        readings: PollutantReadings,
        confidence: f64,
    ) -> Result<Self> {
        let measurement = Self {
            source: source.into(),
            readings,
            confidence,
        };
        measurement.validate()?;
        Ok(measurement)
    }

    fn validate(&self) -> Result<()> {
        if !self.confidence.is_finite() || self.confidence <= 0.0 || self.confidence > 1.0 {
            return Err(ScoreError::invalid_field("confidence", self.confidence));
        }
        self.readings.validate()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMethod {
    /// Mean weighted by source confidence
    #[default]
    WeightedAverage,
    Median,
    /// Highest reported value
    WorstCase,
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len().is_multiple_of(2) {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// One reading set from many sources
///
/// Each pollutant is combined over only the sources that measured it, so an
/// unmeasured pollutant never drags the result toward zero.
///
/// # Errors
///
/// * `ScoreError::InvalidReading` - a source has an invalid confidence
/// * `ScoreError::InvalidConcentration` - a source carries an invalid reading
pub fn combine(
    measurements: &[SourceMeasurement],
    method: CombineMethod,
) -> Result<Availability<PollutantReadings>> {
    if measurements.is_empty() {
        return Ok(Availability::Unavailable(UnavailableReason::NoMeasurements));
    }
    for measurement in measurements {
        measurement.validate()?;
    }

    let mut per_code: BTreeMap<PollutantCode, Vec<(f64, f64)>> = BTreeMap::new();
    for measurement in measurements {
        for reading in measurement.readings.iter() {
            if let Some(value) = reading.concentration {
                per_code
                    .entry(reading.code)
                    .or_default()
                    .push((value, measurement.confidence));
            }
        }
    }

    if per_code.is_empty() {
        return Ok(Availability::Unavailable(UnavailableReason::NoMeasurements));
    }

    let mut combined = PollutantReadings::new();
    for (code, samples) in per_code {
        let value = match method {
            CombineMethod::WeightedAverage => {
                let total: f64 = samples.iter().map(|&(_, w)| w).sum();
                samples.iter().map(|&(v, w)| v * w).sum::<f64>() / total
            }
            CombineMethod::Median => {
                let mut values: Vec<f64> = samples.iter().map(|&(v, _)| v).collect();
                median(&mut values)
            }
            CombineMethod::WorstCase => samples.iter().map(|&(v, _)| v).fold(0.0, f64::max),
        };
        combined.insert(code, value)?;
    }

    debug!(
        sources = measurements.len(),
        pollutants = combined.len(),
        ?method,
        "combined source measurements"
    );
    Ok(Availability::Available(combined))
}
