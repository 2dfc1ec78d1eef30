//! Personal risk multiplier from a health profile snapshot
//!
//! Adjustments are additive and start from 1.0: age group, pregnancy, every
//! listed condition, then sensitivity around the neutral level 3. The result
//! is clamped to 1.0..=3.0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoreError};

pub const MULTIPLIER_MIN: f64 = 1.0;
pub const MULTIPLIER_MAX: f64 = 3.0;

pub const SENSITIVITY_MIN: u8 = 1;
pub const SENSITIVITY_MAX: u8 = 10;
pub const SENSITIVITY_NEUTRAL: u8 = 3;

const SENSITIVITY_STEP: f64 = 0.1;
const AGE_ADJUSTMENT: f64 = 0.3;
const PREGNANCY_ADJUSTMENT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Asthma,
    Copd,
    HeartDisease,
    Diabetes,
    LungDisease,
    Allergies,
    Hypertension,
}

impl Condition {
    /// Additive contribution to the risk multiplier
    #[must_use]
    pub fn adjustment(&self) -> f64 {
        match self {
            Self::Asthma => 0.5,
            Self::Copd => 0.6,
            Self::HeartDisease => 0.4,
            Self::Diabetes => 0.2,
            Self::LungDisease => 0.5,
            // tracked for advice, no multiplier effect
            Self::Allergies | Self::Hypertension => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgeGroup {
    Child,
    #[default]
    Adult,
    OlderAdult,
}

impl AgeGroup {
    #[must_use]
    pub fn adjustment(&self) -> f64 {
        match self {
            Self::Child | Self::OlderAdult => AGE_ADJUSTMENT,
            Self::Adult => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifestyleRisk {
    Smoker,
    OutdoorWorker,
    Athlete,
    Commuter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomesticRisk {
    GasStove,
    WoodStove,
    Mold,
    Pets,
    OldBuilding,
}

/// Read-only health snapshot supplied by the profile collaborator
///
/// Lifestyle and domestic risks are carried for advice and do not change
/// the multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthProfile {
    pub conditions: BTreeSet<Condition>,
    pub age_group: AgeGroup,
    pub is_pregnant: bool,
    pub sensitivity_level: u8,
    pub lifestyle_risks: BTreeSet<LifestyleRisk>,
    pub domestic_risks: BTreeSet<DomesticRisk>,
}

impl Default for HealthProfile {
    fn default() -> Self {
        Self {
            conditions: BTreeSet::new(),
            age_group: AgeGroup::Adult,
            is_pregnant: false,
            sensitivity_level: SENSITIVITY_NEUTRAL,
            lifestyle_risks: BTreeSet::new(),
            domestic_risks: BTreeSet::new(),
        }
    }
}

impl HealthProfile {
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.insert(condition);
        self
    }

    #[must_use]
    pub fn with_age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = age_group;
        self
    }

    #[must_use]
    pub fn pregnant(mut self, is_pregnant: bool) -> Self {
        self.is_pregnant = is_pregnant;
        self
    }

    #[must_use]
    pub fn with_sensitivity(mut self, level: u8) -> Self {
        self.sensitivity_level = level;
        self
    }

    #[must_use]
    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }
}

/// Multiplier in 1.0..=3.0 for the given profile
///
/// # Example
///
/// ```rust
/// use exposure_engine::risk::{compute_risk_multiplier, Condition, HealthProfile};
///
/// let profile = HealthProfile::default().with_condition(Condition::Asthma);
/// assert!((compute_risk_multiplier(&profile).unwrap() - 1.5).abs() < 1e-9);
/// ```
///
/// # Errors
///
/// * `ScoreError::InvalidSensitivity` - sensitivity level outside 1..=10
pub fn compute_risk_multiplier(profile: &HealthProfile) -> Result<f64> {
    let sensitivity = profile.sensitivity_level;
    if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&sensitivity) {
        debug!(sensitivity, "rejecting sensitivity level");
        return Err(ScoreError::InvalidSensitivity(sensitivity));
    }

    let mut multiplier = 1.0;
    multiplier += profile.age_group.adjustment();
    if profile.is_pregnant {
        multiplier += PREGNANCY_ADJUSTMENT;
    }
    multiplier += profile
        .conditions
        .iter()
        .map(Condition::adjustment)
        .sum::<f64>();
    multiplier += (f64::from(sensitivity) - f64::from(SENSITIVITY_NEUTRAL)) * SENSITIVITY_STEP;

    let clamped = multiplier.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
    if (clamped - multiplier).abs() > f64::EPSILON {
        debug!(raw = multiplier, clamped, "risk multiplier clamped");
    }
    Ok(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn every_condition() -> BTreeSet<Condition> {
        [
            Condition::Asthma,
            Condition::Copd,
            Condition::HeartDisease,
            Condition::Diabetes,
            Condition::LungDisease,
            Condition::Allergies,
            Condition::Hypertension,
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn neutral_profile_is_exactly_one() {
        let multiplier = compute_risk_multiplier(&HealthProfile::default()).unwrap();
        assert_eq!(multiplier, 1.0);
    }

    #[test]
    fn worst_profile_is_clamped_to_three() {
        let profile = HealthProfile {
            conditions: every_condition(),
            age_group: AgeGroup::Child,
            is_pregnant: true,
            sensitivity_level: 10,
            ..HealthProfile::default()
        };
        assert_eq!(compute_risk_multiplier(&profile).unwrap(), 3.0);
    }

    #[rstest]
    #[case(HealthProfile::default().with_age_group(AgeGroup::Child), 1.3)]
    #[case(HealthProfile::default().with_age_group(AgeGroup::OlderAdult), 1.3)]
    #[case(HealthProfile::default().pregnant(true), 1.4)]
    #[case(HealthProfile::default().with_condition(Condition::Copd), 1.6)]
    #[case(HealthProfile::default().with_condition(Condition::HeartDisease), 1.4)]
    #[case(HealthProfile::default().with_condition(Condition::Diabetes), 1.2)]
    #[case(HealthProfile::default().with_condition(Condition::LungDisease), 1.5)]
    #[case(HealthProfile::default().with_condition(Condition::Allergies), 1.0)]
    #[case(HealthProfile::default().with_sensitivity(5), 1.2)]
    #[case(HealthProfile::default().with_sensitivity(8), 1.5)]
    fn single_adjustments(#[case] profile: HealthProfile, #[case] expected: f64) {
        let got = compute_risk_multiplier(&profile).unwrap();
        assert!((got - expected).abs() < EPS, "got {got}, expected {expected}");
    }

    #[test]
    fn conditions_are_summed_not_maxed() {
        let profile = HealthProfile::default()
            .with_condition(Condition::Asthma)
            .with_condition(Condition::Diabetes);
        let got = compute_risk_multiplier(&profile).unwrap();
        assert!((got - 1.7).abs() < EPS);
    }

    #[test]
    fn low_sensitivity_offsets_other_adjustments() {
        let profile = HealthProfile::default()
            .with_condition(Condition::Diabetes)
            .with_sensitivity(1);
        // 1.0 + 0.2 - 0.2
        let got = compute_risk_multiplier(&profile).unwrap();
        assert!((got - 1.0).abs() < EPS);
    }

    #[test]
    fn low_sensitivity_alone_is_clamped_to_one() {
        let profile = HealthProfile::default().with_sensitivity(1);
        assert_eq!(compute_risk_multiplier(&profile).unwrap(), 1.0);
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    #[case(u8::MAX)]
    fn invalid_sensitivity_is_rejected(#[case] level: u8) {
        let profile = HealthProfile::default().with_sensitivity(level);
        assert_eq!(
            compute_risk_multiplier(&profile),
            Err(ScoreError::InvalidSensitivity(level))
        );
    }

    #[test]
    fn range_invariant_over_profiles() {
        let ages = [AgeGroup::Child, AgeGroup::Adult, AgeGroup::OlderAdult];
        let conditions: Vec<Condition> = every_condition().into_iter().collect();
        for age in ages {
            for pregnant in [false, true] {
                for sensitivity in SENSITIVITY_MIN..=SENSITIVITY_MAX {
                    for count in 0..=conditions.len() {
                        let profile = HealthProfile {
                            conditions: conditions[..count].iter().copied().collect(),
                            age_group: age,
                            is_pregnant: pregnant,
                            sensitivity_level: sensitivity,
                            ..HealthProfile::default()
                        };
                        let m = compute_risk_multiplier(&profile).unwrap();
                        assert!((MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&m));
                    }
                }
            }
        }
    }

    #[test]
    fn deserializes_camel_case_profile() {
        let json = r#"{
            "conditions": ["asthma", "heartDisease"],
            "ageGroup": "olderAdult",
            "isPregnant": false,
            "sensitivityLevel": 4,
            "domesticRisks": ["gasStove"]
        }"#;
        let profile: HealthProfile = serde_json::from_str(json).unwrap();
        assert!(profile.has_condition(Condition::HeartDisease));
        assert!(profile.has_condition(Condition::Asthma));
        assert!(profile.lifestyle_risks.is_empty());
        assert!(profile.domestic_risks.contains(&DomesticRisk::GasStove));
        // 1.0 + 0.3 + 0.5 + 0.4 + 0.1
        let got = compute_risk_multiplier(&profile).unwrap();
        assert!((got - 2.3).abs() < EPS);
    }
}
