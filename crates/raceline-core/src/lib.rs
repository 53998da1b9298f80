//! Raceline Core -- race event log derivation.
//!
//! This crate turns either a skill-driven simulation or recorded lap
//! telemetry into the same per-race event log: a strictly ordered stream of
//! session metadata, tyre, position and lap-time records that a dashboard
//! can replay lap by lap.
//!
//! # Pipeline
//!
//! 1. **Normalize** -- [`skill::normalize`] turns historical average lap
//!    times into driver skills in `[0.78, 0.95]`.
//! 2. **Produce** -- [`simulate::simulate_race`] synthesizes a race from
//!    skills; [`telemetry::map_race`] derives one from real lap tables.
//! 3. **Order** -- [`log::RaceLog::from_events`] performs a single stable sort
//!    on `(lap, priority)`.
//! 4. **Serialize** -- [`log::Record`] renders the line format; [`log::parse_line`]
//!    reads it back.
//! 5. **Check** -- [`validation::validate_log`] replays a log and reports any
//!    broken ordering, rank or overtake invariant.
//!
//! # Key Types
//!
//! - [`event::RaceEvent`] -- Tagged event with a first-class sort key.
//! - [`log::RaceLog`] -- Immutable, ordered events of one race.
//! - [`order::PositionTracker`] -- Cumulative-time standings with overtake
//!   detection.
//! - [`rng::RaceRng`] -- Injected randomness; [`rng::SimRng`] is the seedable
//!   SplitMix64 implementation.
//! - [`simulate::SimConfig`] -- Tunable race model, loadable from config
//!   files.
//! - [`profile::DriverProfile`] -- One row of the driver profile table.
//! - [`season`] -- Multi-race runners (rayon fan-out behind `parallel`).

pub mod event;
pub mod id;
pub mod log;
pub mod order;
pub mod profile;
pub mod rng;
pub mod season;
pub mod simulate;
pub mod skill;
pub mod telemetry;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
