//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::id::{DriverCode, Lap};
use crate::profile::DriverProfile;
use crate::rng::RaceRng;
use crate::telemetry::{LapRow, StintRow, SummaryRow};

// ===========================================================================
// Random sources
// ===========================================================================

/// A random source with all noise fixed to zero: uniform draws return the
/// midpoint of their range and chance rolls never fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuietRng;

impl RaceRng for QuietRng {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (low + high) / 2.0
    }

    fn chance(&mut self, _probability: f64) -> bool {
        false
    }

    fn index(&mut self, _len: usize) -> usize {
        0
    }
}

/// Zero noise, but every chance roll with a positive probability fires and
/// index draws always pick the first slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct EagerRng;

impl RaceRng for EagerRng {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (low + high) / 2.0
    }

    fn chance(&mut self, probability: f64) -> bool {
        probability > 0.0
    }

    fn index(&mut self, _len: usize) -> usize {
        0
    }
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// Profiles with the given codes and skills; pit reference 20 s.
pub fn roster(drivers: &[(&str, f64)]) -> Vec<DriverProfile> {
    drivers
        .iter()
        .map(|(code, skill)| DriverProfile {
            code: DriverCode::from(*code),
            name: format!("Driver {code}"),
            team: "Test".to_string(),
            skill: *skill,
            pit_seconds: 20.0,
        })
        .collect()
}

/// The standard 20-driver grid used by the demos.
pub fn full_grid() -> Vec<DriverProfile> {
    roster(&[
        ("VER", 0.95),
        ("HAM", 0.90),
        ("NOR", 0.88),
        ("LEC", 0.89),
        ("PIA", 0.87),
        ("RUS", 0.88),
        ("SAI", 0.88),
        ("ALB", 0.82),
        ("SAR", 0.78),
        ("PER", 0.88),
        ("ALO", 0.86),
        ("STR", 0.80),
        ("GAS", 0.81),
        ("OCO", 0.81),
        ("TSU", 0.80),
        ("RIC", 0.80),
        ("BOT", 0.79),
        ("ZHO", 0.78),
        ("HUL", 0.79),
        ("MAG", 0.79),
    ])
}

/// Lap rows from `(lap, driver, seconds)` triples.
pub fn lap_rows(rows: &[(Lap, &str, f64)]) -> Vec<LapRow> {
    rows.iter()
        .map(|(lap, driver, t)| LapRow {
            lap: *lap,
            driver: DriverCode::from(*driver),
            lap_time: Some(*t),
        })
        .collect()
}

/// Stint rows from `(driver, compound, start_lap)` triples.
pub fn stint_rows(rows: &[(&str, &str, Lap)]) -> Vec<StintRow> {
    rows.iter()
        .map(|(driver, compound, start_lap)| StintRow {
            driver: DriverCode::from(*driver),
            compound: compound.to_string(),
            start_lap: *start_lap,
            pit_duration: None,
        })
        .collect()
}

/// Summary rows from `(driver, average lap)` pairs, no weather.
pub fn summary_rows(rows: &[(&str, f64)]) -> Vec<SummaryRow> {
    rows.iter()
        .map(|(driver, avg)| SummaryRow {
            driver: DriverCode::from(*driver),
            avg_lap_time: Some(*avg),
            weather: None,
        })
        .collect()
}
