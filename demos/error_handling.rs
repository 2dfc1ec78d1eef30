//! Error Handling Example for Exposure Engine
//!
//! This example shows the two failure shapes of the engine: `ScoreError` for
//! input that can never be scored, and `Availability::Unavailable` for input
//! that is valid but incomplete. Invalid input is reported and never scored;
//! only incomplete input gets a degraded retry.
//!
//! Run with: cargo run --example error_handling

use std::collections::BTreeMap;

use exposure_engine::{
    Availability, HealthProfile, MissingPolicy, PollutantCode, PollutantReadings, ScoreError,
    ScoringConfig, UnavailableReason, aggregate::score_readings,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Statistics for outcome tracking
#[derive(Debug, Default)]
struct ScoreStats {
    total_attempts: u32,
    scored: u32,
    recovered: u32,
    unavailable: u32,
    invalid_input: u32,
}

impl ScoreStats {
    fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            f64::from(self.scored + self.recovered) / f64::from(self.total_attempts) * 100.0
        }
    }
}

/// Scorer that falls back to degraded modes instead of giving up
struct RobustScorer {
    stats: ScoreStats,
    error_log: Vec<(String, ScoreError)>,
}

impl RobustScorer {
    fn new() -> Self {
        Self {
            stats: ScoreStats::default(),
            error_log: Vec::new(),
        }
    }

    /// Score raw provider values; an invalid value rejects the whole station
    fn score(&mut self, name: &str, raw: &[(PollutantCode, f64)]) -> Option<f64> {
        self.stats.total_attempts += 1;

        let mut readings = PollutantReadings::new();
        for &(code, value) in raw {
            if let Err(e) = readings.insert(code, value) {
                warn!(%code, value, "rejecting station with invalid reading");
                self.stats.invalid_input += 1;
                println!("  ❌ {name}: {e}");
                self.error_log.push((name.to_string(), e));
                return None;
            }
        }

        match score_readings(&readings, MissingPolicy::Suppress) {
            Ok(Availability::Available(scored)) => {
                self.stats.scored += 1;
                println!("  ✅ {name}: {:.1} ({})", scored.score, scored.status);
                Some(scored.score)
            }
            Ok(Availability::Unavailable(reason)) => self.recover(name, &readings, &reason),
            Err(e) => {
                self.stats.invalid_input += 1;
                println!("  ❌ {name}: {e}");
                self.error_log.push((name.to_string(), e));
                None
            }
        }
    }

    /// Zero-fill only pollutants that were never reported
    fn recover(
        &mut self,
        name: &str,
        readings: &PollutantReadings,
        reason: &UnavailableReason,
    ) -> Option<f64> {
        match reason {
            UnavailableReason::MissingPollutants(missing) if missing.len() < 4 => {
                let missing: Vec<&str> = missing.iter().map(PollutantCode::as_str).collect();
                println!("  🔧 {name}: missing {}, retrying zero-filled", missing.join(", "));
                match score_readings(readings, MissingPolicy::ZeroFill) {
                    Ok(Availability::Available(scored)) => {
                        self.stats.recovered += 1;
                        info!(name, score = scored.score, "recovered with zero fill");
                        println!("  ⚠️  {name}: {:.1} (lower bound only)", scored.score);
                        Some(scored.score)
                    }
                    _ => {
                        self.stats.unavailable += 1;
                        None
                    }
                }
            }
            _ => {
                self.stats.unavailable += 1;
                println!("  ❓ {name}: unavailable ({reason:?})");
                None
            }
        }
    }

    fn print_statistics(&self) {
        println!("\n📊 Scorer Statistics");
        println!("====================");
        println!("Total attempts: {}", self.stats.total_attempts);
        println!("Scored: {}", self.stats.scored);
        println!("Recovered (degraded): {}", self.stats.recovered);
        println!("Unavailable: {}", self.stats.unavailable);
        println!("Invalid input: {}", self.stats.invalid_input);
        println!("Success rate: {:.1}%", self.stats.success_rate());
    }

    fn print_error_log(&self) {
        if self.error_log.is_empty() {
            return;
        }

        println!("\n📝 Error Log");
        println!("============");
        let mut groups: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
        for (name, error) in &self.error_log {
            let kind = match error {
                ScoreError::InvalidConcentration { .. } => "Invalid concentration",
                ScoreError::InvalidSensitivity(_) => "Invalid sensitivity",
                ScoreError::InvalidConfig(_) | ScoreError::InvalidWeights(_) => "Invalid config",
                _ => "Other",
            };
            groups.entry(kind).or_default().push(name);
        }
        for (kind, names) in groups {
            println!("{kind} ({} cases): {}", names.len(), names.join(", "));
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("⚠️  Exposure Engine - Error Handling Example");
    println!("===========================================\n");

    let mut scorer = RobustScorer::new();

    println!("🧪 Test 1: Station Batch");
    println!("------------------------");
    let complete = [
        (PollutantCode::Pm25, 12.0),
        (PollutantCode::Pm10, 40.0),
        (PollutantCode::O3, 30.0),
        (PollutantCode::No2, 20.0),
    ];
    let batch: [(&str, &[(PollutantCode, f64)]); 4] = [
        ("downtown", &complete),
        ("harbor", &[(PollutantCode::Pm25, 20.0), (PollutantCode::O3, 50.0)]),
        (
            "faulty sensor",
            &[
                (PollutantCode::Pm25, -3.0),
                (PollutantCode::Pm10, f64::NAN),
                (PollutantCode::O3, 25.0),
                (PollutantCode::No2, 10.0),
            ],
        ),
        ("offline", &[]),
    ];
    for (name, raw) in batch {
        scorer.score(name, raw);
    }

    println!("\n🧪 Test 2: Health Profile");
    println!("-------------------------");
    let profile = HealthProfile::default().with_sensitivity(12);
    let readings = complete
        .iter()
        .try_fold(PollutantReadings::new(), |r, &(code, value)| r.with(code, value));
    match readings.and_then(|r| exposure_engine::assess(&r, &profile, &ScoringConfig::default())) {
        Ok(_) => println!("  ✅ Unexpectedly succeeded"),
        Err(e) => {
            println!("  ❌ Expected error: {e}");
            scorer.error_log.push(("profile".to_string(), e));
        }
    }

    println!("\n🧪 Test 3: Configuration");
    println!("------------------------");
    let documents = [
        ("empty", "{}"),
        ("zero fill", r#"{"missing_policy": "zero_fill"}"#),
        ("typo", r#"{"missing_polcy": "zero_fill"}"#),
        ("negative weight", r#"{"domain_weights": {"wildfire": -0.2}}"#),
    ];
    for (name, json) in documents {
        match ScoringConfig::from_json(json) {
            Ok(config) => println!("  ✅ {name}: {:?}", config.missing_policy),
            Err(e) => {
                println!("  ❌ {name}: {e}");
                scorer.error_log.push((name.to_string(), e));
            }
        }
    }

    scorer.print_statistics();
    scorer.print_error_log();

    println!("\n✅ Error handling example completed!");
}
