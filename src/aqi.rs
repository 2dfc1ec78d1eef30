//! PM2.5 concentration to AQI conversion using EPA breakpoints

use crate::error::Result;
use crate::pollutant::{PollutantCode, validate_concentration};

const AQI_MAX: f64 = 500.0;

/// (concentration low, concentration high, AQI low, AQI high)
const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 6] = [
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
    (150.5, 250.4, 201.0, 300.0),
    (250.5, 500.4, 301.0, 500.0),
];

/// AQI for a PM2.5 concentration in μg/m³, capped at 500
///
/// Values falling in the 0.1 gaps between bands use the band above.
///
/// # Errors
///
/// * `ScoreError::InvalidConcentration` - value is negative, NaN or infinite
pub fn aqi_from_pm25(pm2_5: f64) -> Result<f64> {
    let pm2_5 = validate_concentration(PollutantCode::Pm25, pm2_5)?;

    let (c_lo, c_hi, a_lo, a_hi) = PM25_BREAKPOINTS
        .iter()
        .copied()
        .find(|&(_, c_hi, _, _)| pm2_5 <= c_hi)
        .unwrap_or(PM25_BREAKPOINTS[PM25_BREAKPOINTS.len() - 1]);

    let aqi = (a_hi - a_lo) / (c_hi - c_lo) * (pm2_5 - c_lo) + a_lo;
    Ok(aqi.min(AQI_MAX))
}
