//! Basic Usage Example for Exposure Engine
//!
//! This example scores one set of readings, classifies it and personalizes
//! the advice for a few health profiles.
//!
//! Run with: cargo run --example basic_usage
//! Set `RUST_LOG=exposure_engine=debug` to see the engine's trace output.

use exposure_engine::advice::{
    ActivityLevel, activity_recommendations, find_clean_windows, personal_aqi_threshold,
};
use exposure_engine::risk::{AgeGroup, Condition};
use exposure_engine::{
    Assessment, HealthProfile, PollutantCode, PollutantReadings, ScoringConfig, assess,
    compute_risk_multiplier,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("🌍 Exposure Engine - Basic Usage Example\n");

    let readings = PollutantReadings::new()
        .with(PollutantCode::Pm25, 18.0)?
        .with(PollutantCode::Pm10, 60.0)?
        .with(PollutantCode::O3, 45.0)?
        .with(PollutantCode::No2, 30.0)?
        .with(PollutantCode::WildfireIndex, 12.0)?
        .with(PollutantCode::UniversalAqi, 68.0)?;

    // Example 1: Scoring raw readings
    println!("📊 Example 1: Overall Score");
    println!("===========================");
    for reading in readings.iter() {
        if let Some(value) = reading.concentration {
            println!("  {:<14} {:>7.1} {:?}", reading.code.as_str(), value, reading.unit());
        }
    }
    println!();

    // Example 2: The same readings for different people
    println!("🧑‍⚕️ Example 2: Personalized Advice");
    println!("=================================");
    let profiles = [
        ("Healthy adult", HealthProfile::default()),
        (
            "Adult with asthma",
            HealthProfile::default().with_condition(Condition::Asthma),
        ),
        (
            "Older adult with COPD",
            HealthProfile::default()
                .with_condition(Condition::Copd)
                .with_age_group(AgeGroup::OlderAdult),
        ),
        ("Pregnant, sensitive", HealthProfile::default().pregnant(true).with_sensitivity(7)),
    ];

    let config = ScoringConfig::default();
    for (name, profile) in &profiles {
        println!("  {name}:");
        match assess(&readings, profile, &config)?.available() {
            Some(assessment) => print_assessment(&assessment),
            None => println!("    ❓ Not enough data to score"),
        }
    }
    println!();

    // Example 3: Best hours for a run
    println!("🏃 Example 3: Clean Windows for Exercise");
    println!("========================================");
    let forecast = [72.0, 66.0, 48.0, 41.0, 39.0, 55.0, 61.0, 44.0, 40.0, 47.0, 80.0, 90.0];
    for (name, profile) in &profiles {
        let multiplier = compute_risk_multiplier(profile)?;
        let threshold = personal_aqi_threshold(ActivityLevel::Vigorous, multiplier)?;
        let windows = find_clean_windows(&forecast, threshold, 2)?;
        let now = activity_recommendations(forecast[0], threshold)?;
        println!("  {name} (AQI below {threshold:.0}):");
        println!("    Now: {}", now.summary());
        println!(
            "    Run: {} / Ride: {} / Walk: {}",
            now.running.description(),
            now.cycling.description(),
            now.walking.description()
        );
        if windows.is_empty() {
            println!("    ⛔ No clean window today");
        }
        for window in windows {
            println!(
                "    ✅ {:02}:00-{:02}:00 avg AQI {:.0} ({:?})",
                window.start_hour, window.end_hour, window.avg_aqi, window.quality
            );
        }
    }

    Ok(())
}

fn print_assessment(assessment: &Assessment) {
    let scored = &assessment.air_quality;
    println!(
        "    Score {:.1} -> {} / {} ({})",
        scored.score, scored.status, scored.level, scored.level.description()
    );
    if let Some(code) = scored.dominant_pollutant() {
        println!("    Dominant pollutant: {code}");
    }
    if !scored.missing.is_empty() {
        let missing: Vec<String> = scored.missing.iter().map(ToString::to_string).collect();
        println!("    Not measured: {}", missing.join(", "));
    }
    println!(
        "    Multiplier {:.1}x, personal score {:.1}, strength {}{}",
        assessment.risk_multiplier,
        assessment.personalized_score,
        assessment.strength,
        if assessment.strength.notifies() { " 🔔" } else { "" }
    );
    if let Some(aqi) = assessment.universal_aqi {
        println!("    Provider AQI: {aqi:.0}");
    }
}
