//! Skill normalization from historical race summaries.
//!
//! For every race, each driver's efficiency ratio is the fastest average lap
//! in that race divided by the driver's own average lap (1.0 = fastest).
//! A driver's raw score is the mean of their ratios; raw scores are then
//! min-max rescaled into [`TARGET_MIN`, `TARGET_MAX`].

use std::collections::BTreeMap;

use crate::id::DriverCode;
use crate::profile::{DriverInfo, DriverProfile};
use crate::telemetry::SummaryRow;

/// Skill assigned to the slowest driver.
pub const TARGET_MIN: f64 = 0.78;
/// Skill assigned to the fastest driver.
pub const TARGET_MAX: f64 = 0.95;
/// Skill given to everyone when all raw scores are equal.
pub const DEFAULT_SKILL: f64 = 0.85;

/// A driver's normalized score.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillScore {
    pub driver: DriverCode,
    /// Mean efficiency ratio across races.
    pub raw: f64,
    /// Rescaled skill, rounded to two decimals.
    pub skill: f64,
}

/// Efficiency ratios for one race. Rows without a positive, finite average
/// lap time are ignored; a race with no usable rows yields nothing.
pub fn efficiency_ratios(rows: &[SummaryRow]) -> Vec<(DriverCode, f64)> {
    let valid: Vec<(&DriverCode, f64)> = rows
        .iter()
        .filter_map(|row| match row.avg_lap_time {
            Some(t) if t.is_finite() && t > 0.0 => Some((&row.driver, t)),
            _ => None,
        })
        .collect();

    let Some(best) = valid.iter().map(|(_, t)| *t).min_by(f64::total_cmp) else {
        return Vec::new();
    };

    valid
        .into_iter()
        .map(|(driver, avg)| (driver.clone(), best / avg))
        .collect()
}

/// Per-driver efficiency ratios collected across many races.
#[derive(Debug, Default, Clone)]
pub struct RatioHistory {
    ratios: BTreeMap<DriverCode, Vec<f64>>,
    races: usize,
}

impl RatioHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one race summary into the history. Returns how many ratios were
    /// recorded.
    pub fn add_race(&mut self, rows: &[SummaryRow]) -> usize {
        let ratios = efficiency_ratios(rows);
        if !ratios.is_empty() {
            self.races += 1;
        }
        let recorded = ratios.len();
        for (driver, ratio) in ratios {
            self.ratios.entry(driver).or_default().push(ratio);
        }
        recorded
    }

    /// Races that contributed at least one ratio.
    pub fn races(&self) -> usize {
        self.races
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Mean ratio per driver.
    pub fn raw_scores(&self) -> BTreeMap<DriverCode, f64> {
        self.ratios
            .iter()
            .map(|(driver, ratios)| {
                let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
                (driver.clone(), mean)
            })
            .collect()
    }
}

/// Rescale raw scores into the skill interval.
///
/// Output is sorted fastest first (ties by driver code). An empty input
/// yields an empty output; identical raw scores all map to
/// [`DEFAULT_SKILL`].
pub fn normalize(raw: &BTreeMap<DriverCode, f64>) -> Vec<SkillScore> {
    let Some(min) = raw.values().copied().min_by(f64::total_cmp) else {
        return Vec::new();
    };
    let max = raw.values().copied().max_by(f64::total_cmp).unwrap_or(min);

    let mut scores: Vec<SkillScore> = raw
        .iter()
        .map(|(driver, &score)| {
            let skill = if max == min {
                DEFAULT_SKILL
            } else {
                TARGET_MIN + (score - min) * (TARGET_MAX - TARGET_MIN) / (max - min)
            };
            SkillScore {
                driver: driver.clone(),
                raw: score,
                skill: round2(skill),
            }
        })
        .collect();

    // BTreeMap iteration is already code-ordered, so a stable sort on raw
    // score leaves ties by code.
    scores.sort_by(|a, b| b.raw.total_cmp(&a.raw));
    scores
}

/// Pair scores with identities. `lookup` supplies the database entry or a
/// placeholder for unknown codes.
pub fn build_profiles<F>(scores: &[SkillScore], mut lookup: F) -> Vec<DriverProfile>
where
    F: FnMut(&DriverCode) -> DriverInfo,
{
    scores
        .iter()
        .map(|score| DriverProfile::new(lookup(&score.driver), score.skill))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
