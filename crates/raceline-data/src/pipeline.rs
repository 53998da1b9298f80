//! Directory-level pipelines built from the loaders and the core producers.

use std::path::Path;

use raceline_core::log::RaceLog;
use raceline_core::profile::DriverProfile;
use raceline_core::season::map_season;
use raceline_core::skill::{RatioHistory, build_profiles, normalize};
use tracing::{debug, info};

use crate::loader::DataLoadError;
use crate::race_dir::{load_summaries, load_telemetry};
use crate::schema::DriverDb;

/// Derive driver profiles from every race summary in `dir`, fastest first.
///
/// Fails with [`DataLoadError::NoDriverData`] when no summary contributes a
/// usable average lap time.
pub fn derive_profiles(dir: &Path, db: &DriverDb) -> Result<Vec<DriverProfile>, DataLoadError> {
    let mut history = RatioHistory::new();
    for (race, rows) in load_summaries(dir)? {
        let recorded = history.add_race(&rows);
        debug!(race = %race, ratios = recorded, "folded race summary");
    }
    if history.is_empty() {
        return Err(DataLoadError::NoDriverData {
            dir: dir.to_path_buf(),
        });
    }

    let scores = normalize(&history.raw_scores());
    for score in &scores {
        debug!(driver = %score.driver, raw = score.raw, skill = score.skill, "normalized skill");
    }
    let profiles = build_profiles(&scores, |code| db.lookup(code));
    info!(races = history.races(), drivers = profiles.len(), "derived driver profiles");
    Ok(profiles)
}

/// Map every race of a telemetry directory into ordered logs.
pub fn map_telemetry(dir: &Path) -> Result<Vec<RaceLog>, DataLoadError> {
    Ok(map_season(&load_telemetry(dir)?))
}
