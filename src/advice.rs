//! Personalized recommendation strength, AQI thresholds, activity verdicts
//! and clean windows

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{SCORE_MAX, SCORE_MIN};
use crate::classify::ScoreLevel;
use crate::error::{Result, ScoreError};
use crate::risk::{MULTIPLIER_MAX, MULTIPLIER_MIN};

/// How strongly to push a recommendation to this user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrength {
    Routine,
    Advisory,
    Caution,
    Warning,
    Urgent,
}

impl RecommendationStrength {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Routine => "Routine",
            Self::Advisory => "Advisory",
            Self::Caution => "Caution",
            Self::Warning => "Warning",
            Self::Urgent => "Urgent",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Routine => "No change to your plans needed",
            Self::Advisory => "Keep an eye on conditions today",
            Self::Caution => "Shorten or soften outdoor activity",
            Self::Warning => "Move activity indoors where you can",
            Self::Urgent => "Stay indoors and follow your care plan",
        }
    }

    /// Whether the app should send a push notification
    #[must_use]
    pub fn notifies(&self) -> bool {
        match self {
            Self::Routine | Self::Advisory => false,
            Self::Caution | Self::Warning | Self::Urgent => true,
        }
    }
}

impl fmt::Display for RecommendationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn check_multiplier(multiplier: f64) -> Result<f64> {
    if (MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&multiplier) {
        Ok(multiplier)
    } else {
        Err(ScoreError::invalid_field("risk multiplier", multiplier))
    }
}

/// Score as felt by this user: `score * multiplier`, clamped to 0..100
///
/// # Errors
///
/// * `ScoreError::InvalidReading` - score not finite or multiplier outside 1.0..=3.0
pub fn personalized_score(overall_score: f64, multiplier: f64) -> Result<f64> {
    if !overall_score.is_finite() {
        return Err(ScoreError::invalid_field("overall score", overall_score));
    }
    let multiplier = check_multiplier(multiplier)?;
    Ok((overall_score * multiplier).clamp(SCORE_MIN, SCORE_MAX))
}

/// Final recommendation strength for an overall score and a risk multiplier
///
/// # Example
///
/// ```rust
/// use exposure_engine::advice::{recommendation_strength, RecommendationStrength};
///
/// // a "good" 35 becomes "poor" for a user at 2x risk
/// let strength = recommendation_strength(35.0, 2.0).unwrap();
/// assert_eq!(strength, RecommendationStrength::Warning);
/// ```
///
/// # Errors
///
/// * `ScoreError::InvalidReading` - score not finite or multiplier outside 1.0..=3.0
pub fn recommendation_strength(overall_score: f64, multiplier: f64) -> Result<RecommendationStrength> {
    let level = ScoreLevel::from_score(personalized_score(overall_score, multiplier)?);
    Ok(match level {
        ScoreLevel::Excellent => RecommendationStrength::Routine,
        ScoreLevel::Good => RecommendationStrength::Advisory,
        ScoreLevel::Moderate => RecommendationStrength::Caution,
        ScoreLevel::Poor => RecommendationStrength::Warning,
        ScoreLevel::Hazardous => RecommendationStrength::Urgent,
    })
}

/// Intensity of the planned activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Rest,
    Light,
    #[default]
    Moderate,
    Vigorous,
}

impl ActivityLevel {
    /// AQI tolerated by a healthy adult at this intensity
    #[must_use]
    pub fn base_aqi_threshold(&self) -> f64 {
        match self {
            Self::Rest => 150.0,
            Self::Light => 100.0,
            Self::Moderate => 75.0,
            Self::Vigorous => 50.0,
        }
    }
}

/// AQI above which this user should not do `activity` outdoors
///
/// # Errors
///
/// * `ScoreError::InvalidReading` - multiplier outside 1.0..=3.0
pub fn personal_aqi_threshold(activity: ActivityLevel, multiplier: f64) -> Result<f64> {
    Ok(activity.base_aqi_threshold() / check_multiplier(multiplier)?)
}

/// Running verdict against the personal threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningAdvice {
    Normal,
    Moderate,
    Easy,
    Indoors,
}

impl RunningAdvice {
    fn for_aqi(aqi: f64, threshold: f64) -> Self {
        if aqi < threshold * 0.5 {
            Self::Normal
        } else if aqi < threshold * 0.75 {
            Self::Moderate
        } else if aqi < threshold {
            Self::Easy
        } else {
            Self::Indoors
        }
    }

    #[must_use]
    pub fn recommended(&self) -> bool {
        !matches!(self, Self::Indoors)
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "Normal intensity and duration",
            Self::Moderate => "Moderate intensity, normal duration",
            Self::Easy => "Easy intensity, shorter run",
            Self::Indoors => "Use a treadmill or indoor track",
        }
    }
}

/// Cycling verdict; cyclists breathe harder, so the threshold is 0.85x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclingAdvice {
    Normal,
    Moderate,
    Indoors,
}

impl CyclingAdvice {
    fn for_aqi(aqi: f64, threshold: f64) -> Self {
        let adjusted = threshold * 0.85;
        if aqi < adjusted * 0.5 {
            Self::Normal
        } else if aqi < adjusted {
            Self::Moderate
        } else {
            Self::Indoors
        }
    }

    #[must_use]
    pub fn recommended(&self) -> bool {
        !matches!(self, Self::Indoors)
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "Normal intensity and duration",
            Self::Moderate => "Moderate effort, stay off high-traffic roads",
            Self::Indoors => "Use an indoor trainer",
        }
    }
}

/// Walking verdict; tolerated up to 1.3x the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkingAdvice {
    Normal,
    Limited,
}

impl WalkingAdvice {
    fn for_aqi(aqi: f64, threshold: f64) -> Self {
        if aqi < threshold * 1.3 {
            Self::Normal
        } else {
            Self::Limited
        }
    }

    #[must_use]
    pub fn recommended(&self) -> bool {
        matches!(self, Self::Normal)
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "Fine to walk, prefer parks over busy streets",
            Self::Limited => "Keep time outdoors short",
        }
    }
}

/// Outdoor sports verdict; full play only below 0.6x the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportsAdvice {
    Normal,
    Limited,
    Indoors,
}

impl SportsAdvice {
    fn for_aqi(aqi: f64, threshold: f64) -> Self {
        if aqi < threshold * 0.6 {
            Self::Normal
        } else if aqi < threshold {
            Self::Limited
        } else {
            Self::Indoors
        }
    }

    #[must_use]
    pub fn recommended(&self) -> bool {
        !matches!(self, Self::Indoors)
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "Normal play",
            Self::Limited => "Light activity only, with frequent breaks",
            Self::Indoors => "Move the session indoors",
        }
    }
}

/// Current conditions and per-activity verdicts for one user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecommendations {
    pub current_aqi: f64,
    pub threshold: f64,
    /// Conditions relative to `threshold`, not to the absolute score bands
    pub conditions: ScoreLevel,
    pub running: RunningAdvice,
    pub cycling: CyclingAdvice,
    pub walking: WalkingAdvice,
    pub outdoor_sports: SportsAdvice,
}

impl ActivityRecommendations {
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self.conditions {
            ScoreLevel::Excellent => "Perfect conditions for outdoor exercise",
            ScoreLevel::Good => "Good conditions for most activities",
            ScoreLevel::Moderate => "Moderate conditions, consider a shorter or easier session",
            ScoreLevel::Poor => "Limit outdoor activity, consider indoor alternatives",
            ScoreLevel::Hazardous => "Avoid outdoor exercise and stay indoors",
        }
    }
}

fn rate_conditions(aqi: f64, threshold: f64) -> ScoreLevel {
    if aqi < threshold * 0.5 {
        ScoreLevel::Excellent
    } else if aqi < threshold * 0.75 {
        ScoreLevel::Good
    } else if aqi < threshold {
        ScoreLevel::Moderate
    } else if aqi < threshold * 1.5 {
        ScoreLevel::Poor
    } else {
        ScoreLevel::Hazardous
    }
}

/// Rate current conditions and each activity against a personal AQI threshold
///
/// Pair with [`personal_aqi_threshold`] to get the threshold for a user.
///
/// # Example
///
/// ```rust
/// use exposure_engine::advice::{activity_recommendations, RunningAdvice, WalkingAdvice};
///
/// let advice = activity_recommendations(80.0, 100.0).unwrap();
/// assert_eq!(advice.running, RunningAdvice::Easy);
/// assert_eq!(advice.walking, WalkingAdvice::Normal);
/// ```
///
/// # Errors
///
/// * `ScoreError::InvalidReading` - AQI negative or not finite, threshold not positive
pub fn activity_recommendations(
    current_aqi: f64,
    threshold: f64,
) -> Result<ActivityRecommendations> {
    if !current_aqi.is_finite() || current_aqi < 0.0 {
        return Err(ScoreError::invalid_field("current aqi", current_aqi));
    }
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ScoreError::invalid_field("threshold", threshold));
    }

    let recommendations = ActivityRecommendations {
        current_aqi,
        threshold,
        conditions: rate_conditions(current_aqi, threshold),
        running: RunningAdvice::for_aqi(current_aqi, threshold),
        cycling: CyclingAdvice::for_aqi(current_aqi, threshold),
        walking: WalkingAdvice::for_aqi(current_aqi, threshold),
        outdoor_sports: SportsAdvice::for_aqi(current_aqi, threshold),
    };
    debug!(current_aqi, threshold, conditions = ?recommendations.conditions, "activity verdicts");
    Ok(recommendations)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowQuality {
    Good,
    Moderate,
}

/// Run of forecast hours below the personal threshold, `end_hour` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanWindow {
    pub start_hour: usize,
    pub end_hour: usize,
    pub avg_aqi: f64,
    pub quality: WindowQuality,
}

impl CleanWindow {
    #[must_use]
    pub fn duration_hours(&self) -> usize {
        self.end_hour - self.start_hour
    }
}

fn close_window(forecast: &[f64], start: usize, end: usize, threshold: f64) -> CleanWindow {
    let hours = &forecast[start..end];
    let avg_aqi = hours.iter().sum::<f64>() / hours.len() as f64;
    let quality = if avg_aqi < threshold * 0.75 {
        WindowQuality::Good
    } else {
        WindowQuality::Moderate
    };
    CleanWindow {
        start_hour: start,
        end_hour: end,
        avg_aqi,
        quality,
    }
}

/// Contiguous hourly runs strictly below `threshold`, at least `min_hours` long
///
/// # Errors
///
/// * `ScoreError::InvalidReading` - forecast value or threshold negative or not finite
pub fn find_clean_windows(
    forecast_aqi: &[f64],
    threshold: f64,
    min_hours: usize,
) -> Result<Vec<CleanWindow>> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ScoreError::invalid_field("threshold", threshold));
    }
    if let Some(&bad) = forecast_aqi.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(ScoreError::invalid_field("forecast aqi", bad));
    }

    let min_hours = min_hours.max(1);
    let mut windows = Vec::new();
    let mut start = None;

    for (hour, &aqi) in forecast_aqi.iter().enumerate() {
        match (aqi < threshold, start) {
            (true, None) => start = Some(hour),
            (false, Some(begin)) => {
                if hour - begin >= min_hours {
                    windows.push(close_window(forecast_aqi, begin, hour, threshold));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start
        && forecast_aqi.len() - begin >= min_hours
    {
        windows.push(close_window(forecast_aqi, begin, forecast_aqi.len(), threshold));
    }
    Ok(windows)
}
