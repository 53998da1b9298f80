//! Invariant checks for finished race logs.
//!
//! [`validate_log`] replays a log the way a dashboard would and reports every
//! place it breaks the contract:
//!
//! - sort keys must be non-decreasing;
//! - after each lap, the ranks of the drivers running that lap must be
//!   exactly `1..=N` (the last `POS` per driver wins, which is how simulator
//!   swaps update a standing grid; laps without any `POS` carry the grid
//!   over unchanged);
//! - an `OVERTAKE` needs a recorded rank on the previous lap that is
//!   strictly worse than the rank it claims.
//!
//! [`lap_totals`] sums each driver's lap-time evidence for reports.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::event::{RaceEvent, SortKey};
use crate::id::{DriverCode, Lap};
use crate::log::RaceLog;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("event {index} ({current:?}) sorts before its predecessor ({previous:?})")]
    OutOfOrder {
        index: usize,
        previous: SortKey,
        current: SortKey,
    },

    #[error("lap {lap}: ranks {ranks:?} are not 1..={}", .ranks.len())]
    RankSet { lap: Lap, ranks: Vec<u32> },

    #[error("lap {lap}: {driver} overtake without a better rank (now {rank:?}, before {previous:?})")]
    UnearnedOvertake {
        lap: Lap,
        driver: DriverCode,
        rank: Option<u32>,
        previous: Option<u32>,
    },

    #[error("lap {lap}: {driver} overtake claims P{claimed} but stands P{actual:?}")]
    OvertakeRankMismatch {
        lap: Lap,
        driver: DriverCode,
        claimed: u32,
        actual: Option<u32>,
    },
}

/// Check a log against the ordering, rank and overtake invariants.
pub fn validate_log(log: &RaceLog) -> Vec<Violation> {
    let mut violations = Vec::new();
    let events = log.events();

    for (index, pair) in events.windows(2).enumerate() {
        let (previous, current) = (pair[0].sort_key(), pair[1].sort_key());
        if current < previous {
            violations.push(Violation::OutOfOrder {
                index: index + 1,
                previous,
                current,
            });
        }
    }

    let mut by_lap: BTreeMap<Lap, Vec<&RaceEvent>> = BTreeMap::new();
    for event in events {
        by_lap.entry(event.lap()).or_default().push(event);
    }

    let mut standings: HashMap<DriverCode, u32> = HashMap::new();
    let mut previous: HashMap<DriverCode, u32> = HashMap::new();

    for (&lap, lap_events) in &by_lap {
        // A batch lists exactly the classified drivers; without one, anyone
        // with a lap or pit record is still running.
        let mut batched: HashSet<&DriverCode> = HashSet::new();
        let mut timed: HashSet<&DriverCode> = HashSet::new();
        let mut saw_position = false;
        for event in lap_events {
            match event {
                RaceEvent::Position { driver, rank, .. } => {
                    standings.insert(driver.clone(), *rank);
                    saw_position = true;
                }
                RaceEvent::LapTime { driver, .. } | RaceEvent::PitStop { driver, .. } => {
                    timed.insert(driver);
                }
                RaceEvent::LapBatch { times, .. } => {
                    batched.extend(times.iter().map(|(driver, _)| driver));
                }
                _ => {}
            }
        }
        let running = if batched.is_empty() { timed } else { batched };
        if saw_position && !running.is_empty() {
            standings.retain(|driver, _| running.contains(driver));
        }
        if !saw_position && running.is_empty() {
            continue;
        }

        let mut ranks: Vec<u32> = standings.values().copied().collect();
        ranks.sort_unstable();
        if ranks.iter().enumerate().any(|(i, &r)| r != i as u32 + 1) {
            violations.push(Violation::RankSet { lap, ranks });
        }

        for event in lap_events {
            if let RaceEvent::Overtake { driver, rank, .. } = event {
                let actual = standings.get(driver).copied();
                let before = previous.get(driver).copied();
                if actual != Some(*rank) {
                    violations.push(Violation::OvertakeRankMismatch {
                        lap,
                        driver: driver.clone(),
                        claimed: *rank,
                        actual,
                    });
                }
                let earned = matches!((actual, before), (Some(now), Some(was)) if now < was);
                if !earned {
                    violations.push(Violation::UnearnedOvertake {
                        lap,
                        driver: driver.clone(),
                        rank: actual,
                        previous: before,
                    });
                }
            }
        }

        previous = standings.clone();
    }

    violations
}

/// Lap count and summed time per driver.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverTotals {
    pub laps: u32,
    pub time: f64,
}

/// Sum each driver's time over the laps they have evidence for. A `BATCH`
/// entry wins over a `LAP` or `PIT` record for the same lap; a pit lap
/// counts its pit duration.
pub fn lap_totals(log: &RaceLog) -> BTreeMap<DriverCode, DriverTotals> {
    let mut per_lap: HashMap<(&DriverCode, Lap), f64> = HashMap::new();
    for event in log.events() {
        match event {
            RaceEvent::LapBatch { lap, times } => {
                for (driver, t) in times {
                    per_lap.insert((driver, *lap), *t);
                }
            }
            RaceEvent::LapTime {
                driver,
                lap,
                seconds: t,
            }
            | RaceEvent::PitStop {
                driver,
                lap,
                duration: t,
            } => {
                per_lap.entry((driver, *lap)).or_insert(*t);
            }
            _ => {}
        }
    }

    let mut totals: BTreeMap<DriverCode, DriverTotals> = BTreeMap::new();
    for ((driver, _), t) in per_lap {
        let entry = totals.entry(driver.clone()).or_default();
        entry.laps += 1;
        entry.time += t;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RaceId;

    fn d(code: &str) -> DriverCode {
        DriverCode::from(code)
    }

    fn pos(driver: &str, lap: Lap, rank: u32) -> RaceEvent {
        RaceEvent::Position {
            driver: d(driver),
            lap,
            rank,
        }
    }

    fn overtake(driver: &str, lap: Lap, rank: u32) -> RaceEvent {
        RaceEvent::Overtake {
            driver: d(driver),
            lap,
            rank,
        }
    }

    fn lap_time(driver: &str, lap: Lap, seconds: f64) -> RaceEvent {
        RaceEvent::LapTime {
            driver: d(driver),
            lap,
            seconds,
        }
    }

    #[test]
    fn clean_log_has_no_violations() {
        let log = RaceLog::from_events(
            RaceId(1),
            vec![
                pos("A", 1, 1),
                pos("B", 1, 2),
                lap_time("A", 1, 90.0),
                lap_time("B", 1, 91.0),
                lap_time("A", 2, 92.0),
                lap_time("B", 2, 90.0),
                overtake("B", 2, 1),
                pos("B", 2, 1),
                pos("A", 2, 2),
            ],
        );
        assert_eq!(validate_log(&log), vec![]);
    }

    #[test]
    fn detects_out_of_order_events() {
        let log = RaceLog::as_recorded(RaceId(1), vec![pos("A", 2, 1), pos("A", 1, 1)]);
        assert!(matches!(
            validate_log(&log)[0],
            Violation::OutOfOrder { index: 1, .. }
        ));
    }

    #[test]
    fn detects_duplicate_ranks() {
        let log = RaceLog::from_events(RaceId(1), vec![pos("A", 1, 1), pos("B", 1, 1)]);
        assert_eq!(
            validate_log(&log),
            vec![Violation::RankSet {
                lap: 1,
                ranks: vec![1, 1]
            }]
        );
    }

    #[test]
    fn detects_unearned_overtake() {
        let log = RaceLog::from_events(
            RaceId(1),
            vec![pos("A", 1, 1), pos("B", 1, 2), overtake("A", 2, 1), pos("A", 2, 1), pos("B", 2, 2)],
        );
        assert_eq!(
            validate_log(&log),
            vec![Violation::UnearnedOvertake {
                lap: 2,
                driver: d("A"),
                rank: Some(1),
                previous: Some(1),
            }]
        );
    }

    #[test]
    fn first_lap_overtake_is_unearned() {
        let log = RaceLog::from_events(RaceId(1), vec![pos("A", 1, 1), overtake("A", 1, 1)]);
        assert!(matches!(
            validate_log(&log)[..],
            [Violation::UnearnedOvertake { previous: None, .. }]
        ));
    }

    #[test]
    fn retired_driver_leaves_the_standings() {
        let batch = |lap, drivers: &[&str]| RaceEvent::LapBatch {
            lap,
            times: drivers.iter().map(|x| (d(x), 90.0)).collect(),
        };
        let log = RaceLog::from_events(
            RaceId(1),
            vec![
                pos("A", 1, 1),
                pos("B", 1, 2),
                pos("C", 1, 3),
                batch(1, &["A", "B", "C"]),
                pos("A", 2, 1),
                pos("C", 2, 2),
                batch(2, &["A", "C"]),
            ],
        );
        assert_eq!(validate_log(&log), vec![]);
    }

    #[test]
    fn pit_only_lap_carries_standings() {
        let log = RaceLog::from_events(
            RaceId(1),
            vec![
                pos("A", 1, 1),
                pos("B", 1, 2),
                RaceEvent::PitStop {
                    driver: d("B"),
                    lap: 2,
                    duration: 0.0,
                },
                pos("B", 3, 1),
                overtake("B", 3, 1),
                pos("A", 3, 2),
            ],
        );
        assert_eq!(validate_log(&log), vec![]);
    }

    #[test]
    fn totals_prefer_batch_and_count_pits() {
        let log = RaceLog::from_events(
            RaceId(1),
            vec![
                lap_time("A", 1, 90.0),
                RaceEvent::PitStop {
                    driver: d("A"),
                    lap: 2,
                    duration: 20.0,
                },
                RaceEvent::LapBatch {
                    lap: 3,
                    times: vec![(d("A"), 91.5)],
                },
                lap_time("A", 3, 99.0),
            ],
        );
        let totals = lap_totals(&log);
        assert_eq!(
            totals[&d("A")],
            DriverTotals {
                laps: 3,
                time: 201.5
            }
        );
    }
}
