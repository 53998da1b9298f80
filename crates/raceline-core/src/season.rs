//! Season runners: many independent races, one log per race.
//!
//! Each simulated race draws from its own [`SimRng`] derived from the season
//! seed and the race id, so a season is reproducible no matter how races are
//! scheduled. With the `parallel` feature races fan out over rayon; results
//! always come back in race-id order.

use std::io::{self, Write};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::info;

use crate::log::RaceLog;
use crate::profile::DriverProfile;
use crate::rng::SimRng;
use crate::simulate::{RaceSpec, SimConfig, SimError, simulate_race};
use crate::telemetry::{TelemetryRace, map_race};

/// Simulate every race of a season.
///
/// Fails on the first race that cannot be simulated; the config is checked
/// once up front so a bad config never reaches the per-race workers.
pub fn simulate_season(
    races: &[RaceSpec],
    roster: &[DriverProfile],
    config: &SimConfig,
    seed: u64,
) -> Result<Vec<RaceLog>, SimError> {
    config.validate()?;

    let mut ordered: Vec<&RaceSpec> = races.iter().collect();
    ordered.sort_by_key(|race| race.race_id);

    let run = |race: &&RaceSpec| {
        let mut rng = SimRng::for_race(seed, race.race_id.0);
        simulate_race(race, roster, config, &mut rng)
    };

    #[cfg(feature = "parallel")]
    let logs: Result<Vec<RaceLog>, SimError> = ordered.par_iter().map(run).collect();
    #[cfg(not(feature = "parallel"))]
    let logs: Result<Vec<RaceLog>, SimError> = ordered.iter().map(run).collect();

    let logs = logs?;
    info!(
        races = logs.len(),
        drivers = roster.len(),
        events = total_events(&logs),
        seed,
        "simulated season"
    );
    Ok(logs)
}

/// Map every real race of a season. Mapping never fails; races with no
/// usable rows yield logs holding only session metadata.
pub fn map_season(races: &[TelemetryRace]) -> Vec<RaceLog> {
    let mut ordered: Vec<&TelemetryRace> = races.iter().collect();
    ordered.sort_by_key(|race| race.race_id);

    let run = |race: &&TelemetryRace| map_race(race.race_id, &race.name, &race.tables);

    #[cfg(feature = "parallel")]
    let logs: Vec<RaceLog> = ordered.par_iter().map(run).collect();
    #[cfg(not(feature = "parallel"))]
    let logs: Vec<RaceLog> = ordered.iter().map(run).collect();

    info!(races = logs.len(), events = total_events(&logs), "mapped season");
    logs
}

/// Write logs back to back, one record per line.
pub fn write_season<W: Write>(logs: &[RaceLog], out: &mut W) -> io::Result<()> {
    for log in logs {
        log.write_to(out)?;
    }
    Ok(())
}

fn total_events(logs: &[RaceLog]) -> usize {
    logs.iter().map(RaceLog::len).sum()
}
