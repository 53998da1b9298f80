//! Ordering and position derivation shared by every event producer.
//!
//! Two concerns live here:
//!
//! - [`sort_events`]: the one stable sort that puts a race into
//!   `(lap, priority)` order while keeping producer order among equal keys.
//! - [`PositionTracker`]: running cumulative time per driver, rank
//!   derivation and overtake detection, one lap at a time.
//!
//! Lap order is a correctness requirement for the tracker: each lap's ranks
//! depend on the previous lap's totals and positions.

use std::collections::{HashMap, HashSet};

use crate::event::RaceEvent;
use crate::id::{DriverCode, Lap};

/// Stable sort by [`crate::event::SortKey`].
pub fn sort_events(events: &mut [RaceEvent]) {
    events.sort_by_key(RaceEvent::sort_key);
}

/// Whether a slice is already in sort-key order.
pub fn is_ordered(events: &[RaceEvent]) -> bool {
    events.windows(2).all(|w| w[0].sort_key() <= w[1].sort_key())
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// One driver's position at the end of a lap.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub driver: DriverCode,
    /// 1 = leader.
    pub rank: u32,
    /// Raw time for this lap.
    pub lap_time: f64,
    /// Cumulative time including this lap.
    pub total: f64,
    /// Rank at the end of the previously recorded lap, if the driver had one.
    pub previous_rank: Option<u32>,
}

impl Standing {
    /// Rank strictly improved relative to a recorded previous rank.
    pub fn gained_place(&self) -> bool {
        matches!(self.previous_rank, Some(prev) if self.rank < prev)
    }
}

// ---------------------------------------------------------------------------
// PositionTracker
// ---------------------------------------------------------------------------

/// Cumulative-time ranking across the laps of one race.
///
/// Owned by a single producer for the duration of one race.
#[derive(Debug, Default)]
pub struct PositionTracker {
    totals: HashMap<DriverCode, f64>,
    previous: HashMap<DriverCode, u32>,
    laps_recorded: usize,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one lap of `(driver, lap_time)` rows, in input order.
    ///
    /// Drivers are ranked ascending by cumulative time; ties keep input row
    /// order. Only the first row per driver counts. Drivers absent from this
    /// lap keep their total but lose their previous rank.
    pub fn record_lap(&mut self, rows: &[(DriverCode, f64)]) -> Vec<Standing> {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut standings = Vec::with_capacity(rows.len());

        for (driver, lap_time) in rows {
            if !seen.insert(driver) {
                continue;
            }
            let total = self.totals.entry(driver.clone()).or_insert(0.0);
            *total += lap_time;
            standings.push(Standing {
                driver: driver.clone(),
                rank: 0,
                lap_time: *lap_time,
                total: *total,
                previous_rank: self.previous.get(driver).copied(),
            });
        }

        // sort_by is stable, which gives the input-order tie break.
        standings.sort_by(|a, b| a.total.total_cmp(&b.total));
        for (i, standing) in standings.iter_mut().enumerate() {
            standing.rank = i as u32 + 1;
        }

        self.previous = standings
            .iter()
            .map(|s| (s.driver.clone(), s.rank))
            .collect();
        self.laps_recorded += 1;
        standings
    }

    /// Cumulative time for a driver so far.
    pub fn total(&self, driver: &DriverCode) -> Option<f64> {
        self.totals.get(driver).copied()
    }

    /// Rank at the end of the most recently recorded lap.
    pub fn rank(&self, driver: &DriverCode) -> Option<u32> {
        self.previous.get(driver).copied()
    }

    pub fn laps_recorded(&self) -> usize {
        self.laps_recorded
    }
}

/// Turn one lap's standings into events: a `POS` per driver in rank order,
/// each followed by an `OVERTAKE` when the driver gained a place, then the
/// lap's `BATCH` summary.
pub fn standings_events(lap: Lap, standings: &[Standing]) -> Vec<RaceEvent> {
    let mut events = Vec::with_capacity(standings.len() + 1);
    for s in standings {
        events.push(RaceEvent::Position {
            driver: s.driver.clone(),
            lap,
            rank: s.rank,
        });
        if s.gained_place() {
            events.push(RaceEvent::Overtake {
                driver: s.driver.clone(),
                lap,
                rank: s.rank,
            });
        }
    }
    events.push(RaceEvent::LapBatch {
        lap,
        times: standings
            .iter()
            .map(|s| (s.driver.clone(), s.lap_time))
            .collect(),
    });
    events
}
