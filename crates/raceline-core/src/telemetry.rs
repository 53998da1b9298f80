//! Telemetry-to-event mapping for real races.
//!
//! Takes the already-parsed lap, stint and summary tables of one race and
//! derives the same event vocabulary the simulator produces:
//!
//! - `TRACK/NAME` and `TRACK/WEATHER` on lap 0
//! - `COMPOUND` at each stint start (lap 0 for stints starting on lap 1)
//! - `PIT` on the lap before every later stint, inferred from the boundary
//! - `POS`, `OVERTAKE` and `BATCH` per lap, ranked by cumulative time
//!
//! Pit stops are an approximation: exactly one stop is assumed between
//! consecutive stints, and [`PIT_PLACEHOLDER_SECONDS`] stands in for the
//! duration when the stint table carries no measured value.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::event::{RaceEvent, normalize_compound};
use crate::id::{DriverCode, Lap, RaceId};
use crate::log::RaceLog;
use crate::order::{PositionTracker, standings_events};

/// Pit duration written when the source has no measured value.
pub const PIT_PLACEHOLDER_SECONDS: f64 = 0.0;

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// One row of the lap-time table. `lap_time` is `None` when the source value
/// was missing or non-numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct LapRow {
    pub lap: Lap,
    pub driver: DriverCode,
    pub lap_time: Option<f64>,
}

/// One tyre stint.
#[derive(Debug, Clone, PartialEq)]
pub struct StintRow {
    pub driver: DriverCode,
    pub compound: String,
    pub start_lap: Lap,
    /// Measured stationary time of the stop that began this stint, if known.
    pub pit_duration: Option<f64>,
}

/// One row of the per-race driver summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub driver: DriverCode,
    pub avg_lap_time: Option<f64>,
    /// Free-text weather description; absent columns read as `None`.
    pub weather: Option<String>,
}

/// The parsed tables for one race. Missing tables are simply empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceTables {
    pub laps: Vec<LapRow>,
    pub stints: Vec<StintRow>,
    pub summary: Vec<SummaryRow>,
}

/// One real race as discovered on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRace {
    pub race_id: RaceId,
    pub name: String,
    pub tables: RaceTables,
}

/// `true` when the text mentions rain without negating it.
pub fn is_wet(weather: &str) -> bool {
    weather.contains("Rain") && !weather.contains("Not")
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Derive the ordered event log of one real race.
pub fn map_race(race_id: RaceId, name: &str, tables: &RaceTables) -> RaceLog {
    let mut events = Vec::new();

    events.push(RaceEvent::TrackName {
        name: name.to_string(),
    });
    if let Some(first) = tables.summary.first() {
        let text = first.weather.as_deref().unwrap_or("");
        events.push(RaceEvent::Weather { wet: is_wet(text) });
    }

    stint_events(&tables.stints, &mut events);
    lap_events(race_id, &tables.laps, &mut events);

    let log = RaceLog::from_events(race_id, events);
    debug!(race = %race_id, name, events = log.len(), "mapped telemetry race");
    log
}

fn stint_events(stints: &[StintRow], events: &mut Vec<RaceEvent>) {
    let mut first_start: HashMap<&DriverCode, Lap> = HashMap::new();
    for stint in stints {
        first_start
            .entry(&stint.driver)
            .and_modify(|lap| *lap = (*lap).min(stint.start_lap))
            .or_insert(stint.start_lap);
    }

    for stint in stints {
        let start = stint.start_lap;
        events.push(RaceEvent::Compound {
            driver: stint.driver.clone(),
            lap: if start == 1 { 0 } else { start },
            compound: normalize_compound(&stint.compound),
        });

        let opening = first_start.get(&stint.driver).copied() == Some(start);
        if start > 1 && !opening {
            events.push(RaceEvent::PitStop {
                driver: stint.driver.clone(),
                lap: start - 1,
                duration: stint.pit_duration.unwrap_or(PIT_PLACEHOLDER_SECONDS),
            });
        }
    }
}

fn lap_events(race_id: RaceId, rows: &[LapRow], events: &mut Vec<RaceEvent>) {
    let mut by_lap: BTreeMap<Lap, Vec<(DriverCode, f64)>> = BTreeMap::new();
    let mut dropped = 0usize;
    for row in rows {
        match row.lap_time {
            Some(t) if t.is_finite() => by_lap
                .entry(row.lap)
                .or_default()
                .push((row.driver.clone(), t)),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(race = %race_id, dropped, "dropped lap rows without a numeric lap time");
    }

    let mut tracker = PositionTracker::new();
    for (lap, rows) in &by_lap {
        let standings = tracker.record_lap(rows);
        events.extend(standings_events(*lap, &standings));
    }
}
