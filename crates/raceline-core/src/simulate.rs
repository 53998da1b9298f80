//! Synthetic race generation from driver skill.
//!
//! # Per-race pipeline
//!
//! 1. **Session** -- track name (if any) and every driver's opening compound
//!    on lap 0.
//! 2. **Qualifying** -- `skill * 100 + noise` decides the grid, emitted as
//!    lap 1 `POS` events.
//! 3. **Laps** -- for each lap, every driver (in running order) gets one `LAP`
//!    or one `PIT` event. Pit stops reset tyre age and switch compound.
//! 4. **Overtake** -- after lap 1, at most one adjacent pair swaps per lap.
//!
//! Randomness comes only from the injected [`RaceRng`], so a race is a pure
//! function of roster, config and random stream.
//!
//! Pit stops are stochastic: with a 30% roll per eligible lap a
//! driver may stop once, more than once, or not at all.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::RaceEvent;
use crate::id::{DriverCode, Lap, RaceId};
use crate::log::RaceLog;
use crate::profile::DriverProfile;
use crate::rng::RaceRng;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a race cannot be simulated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("race {0} has an empty roster")]
    EmptyRoster(RaceId),

    #[error("race {race} has invalid base lap time {base}")]
    InvalidBaseLapTime { race: RaceId, base: f64 },

    #[error("invalid simulation config: {detail}")]
    InvalidConfig { detail: String },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables of the race model. Every field has a default, so config files
/// may override any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Laps per race.
    pub laps: u32,
    /// First lap on which a pit stop may happen.
    pub pit_window_start: Lap,
    /// Last lap on which a pit stop may happen.
    pub pit_window_end: Lap,
    /// Tyres must be strictly older than this to pit.
    pub min_pit_tyre_age: u32,
    /// Probability of pitting on each eligible lap.
    pub pit_chance: f64,
    /// Mean pit-stop duration in seconds.
    pub pit_seconds: f64,
    /// Pit duration varies uniformly by +/- this many seconds.
    pub pit_jitter: f64,
    /// Qualifying score noise, +/- points on the `skill * 100` scale.
    pub qualifying_noise: f64,
    /// Lap time noise, +/- seconds.
    pub lap_noise: f64,
    /// Tyre age at which wear reaches `wear_max_penalty`.
    pub wear_horizon: f64,
    /// Wear penalty in seconds at `wear_horizon` laps.
    pub wear_max_penalty: f64,
    /// Probability of one overtake per lap after the first.
    pub overtake_chance: f64,
    /// Compound every driver starts on.
    pub start_compound: String,
    /// Compound fitted at a pit stop.
    pub pit_compound: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            laps: 20,
            pit_window_start: 8,
            pit_window_end: 12,
            min_pit_tyre_age: 8,
            pit_chance: 0.3,
            pit_seconds: 20.0,
            pit_jitter: 1.0,
            qualifying_noise: 5.0,
            lap_noise: 0.5,
            wear_horizon: 20.0,
            wear_max_penalty: 2.0,
            overtake_chance: 0.5,
            start_compound: "Medium".to_string(),
            pit_compound: "Hard".to_string(),
        }
    }
}

impl SimConfig {
    /// Set the number of laps per race.
    pub fn with_laps(mut self, laps: u32) -> Self {
        self.laps = laps;
        self
    }

    /// Set the pit window (inclusive).
    pub fn with_pit_window(mut self, start: Lap, end: Lap) -> Self {
        self.pit_window_start = start;
        self.pit_window_end = end;
        self
    }

    /// Set the per-lap overtake probability.
    pub fn with_overtake_chance(mut self, chance: f64) -> Self {
        self.overtake_chance = chance;
        self
    }

    /// Check ranges that would otherwise produce a malformed race.
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |detail: String| Err(SimError::InvalidConfig { detail });
        if self.laps == 0 {
            return invalid("laps must be at least 1".into());
        }
        if self.pit_window_start > self.pit_window_end {
            return invalid(format!(
                "pit window {}..={} is empty",
                self.pit_window_start, self.pit_window_end
            ));
        }
        for (name, p) in [
            ("pit_chance", self.pit_chance),
            ("overtake_chance", self.overtake_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be within [0, 1], got {p}"));
            }
        }
        if self.wear_horizon.is_nan() || self.wear_horizon <= 0.0 {
            return invalid(format!("wear_horizon must be positive, got {}", self.wear_horizon));
        }
        Ok(())
    }

    /// Time lost to tyre wear: quadratic in tyre age, reaching
    /// `wear_max_penalty` at `wear_horizon` laps.
    pub fn wear_penalty(&self, tyre_age: u32) -> f64 {
        (f64::from(tyre_age) / self.wear_horizon).powi(2) * self.wear_max_penalty
    }

    /// Noise-free, wear-free lap time for a driver of the given skill.
    pub fn clean_lap_time(&self, base_lap_time: f64, skill: f64) -> f64 {
        base_lap_time / (0.8 + skill * 0.2)
    }

    /// Whether a driver on `tyre_age`-lap-old tyres may pit on `lap`.
    pub fn pit_eligible(&self, lap: Lap, tyre_age: u32) -> bool {
        (self.pit_window_start..=self.pit_window_end).contains(&lap)
            && tyre_age > self.min_pit_tyre_age
    }
}

/// Wear penalty under the default model.
pub fn tyre_wear_penalty(tyre_age: u32) -> f64 {
    SimConfig::default().wear_penalty(tyre_age)
}

// ---------------------------------------------------------------------------
// Race definition and state
// ---------------------------------------------------------------------------

/// One race of a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSpec {
    pub race_id: RaceId,
    /// Reference lap time in seconds before skill scaling.
    pub base_lap_time: f64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Per-driver state while a race is being simulated.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRaceState {
    pub driver: DriverCode,
    pub total_time: f64,
    pub rank: u32,
    pub tyre_age: u32,
    pub compound: String,
    pub pit_stops: u32,
}

impl DriverRaceState {
    fn new(driver: DriverCode, compound: &str) -> Self {
        Self {
            driver,
            total_time: 0.0,
            rank: 0,
            tyre_age: 0,
            compound: compound.to_string(),
            pit_stops: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Simulate one race and return its ordered event log.
pub fn simulate_race<R>(
    race: &RaceSpec,
    roster: &[DriverProfile],
    config: &SimConfig,
    rng: &mut R,
) -> Result<RaceLog, SimError>
where
    R: RaceRng + ?Sized,
{
    config.validate()?;
    if roster.is_empty() {
        return Err(SimError::EmptyRoster(race.race_id));
    }
    if !(race.base_lap_time.is_finite() && race.base_lap_time > 0.0) {
        return Err(SimError::InvalidBaseLapTime {
            race: race.race_id,
            base: race.base_lap_time,
        });
    }

    let mut events = Vec::with_capacity(roster.len() * (config.laps as usize + 2));
    let mut states: Vec<DriverRaceState> = roster
        .iter()
        .map(|p| DriverRaceState::new(p.code.clone(), &config.start_compound))
        .collect();

    // Phase 1: session.
    if let Some(name) = &race.name {
        events.push(RaceEvent::TrackName { name: name.clone() });
    }
    for state in &states {
        events.push(RaceEvent::Compound {
            driver: state.driver.clone(),
            lap: 0,
            compound: state.compound.clone(),
        });
    }

    // Phase 2: qualifying.
    let mut order = qualifying_order(roster, config, rng);
    for (pos, &i) in order.iter().enumerate() {
        let state = &mut states[i];
        state.rank = pos as u32 + 1;
        events.push(RaceEvent::Position {
            driver: state.driver.clone(),
            lap: 1,
            rank: state.rank,
        });
    }

    // Phases 3 and 4, strictly lap by lap.
    let mut overtakes = 0u32;
    for lap in 1..=config.laps {
        for &i in &order {
            run_lap(
                lap,
                &roster[i],
                &mut states[i],
                race.base_lap_time,
                config,
                rng,
                &mut events,
            );
        }

        if lap > 1 && order.len() > 1 && rng.chance(config.overtake_chance) {
            let idx = rng.index(order.len() - 1);
            order.swap(idx, idx + 1);
            let (promoted, demoted) = (order[idx], order[idx + 1]);
            states[promoted].rank = idx as u32 + 1;
            states[demoted].rank = idx as u32 + 2;

            events.push(RaceEvent::Overtake {
                driver: states[promoted].driver.clone(),
                lap,
                rank: states[promoted].rank,
            });
            for &i in &[promoted, demoted] {
                events.push(RaceEvent::Position {
                    driver: states[i].driver.clone(),
                    lap,
                    rank: states[i].rank,
                });
            }
            overtakes += 1;
        }
    }

    let pit_stops: u32 = states.iter().map(|s| s.pit_stops).sum();
    debug!(
        race = %race.race_id,
        drivers = roster.len(),
        laps = config.laps,
        pit_stops,
        overtakes,
        "simulated race"
    );
    for &i in &order {
        let state = &states[i];
        debug!(
            race = %race.race_id,
            driver = %state.driver,
            rank = state.rank,
            total_time = state.total_time,
            pit_stops = state.pit_stops,
            "final standing"
        );
    }

    Ok(RaceLog::from_events(race.race_id, events))
}

/// Grid order as roster indices: `skill * 100 + noise`, best first. Equal
/// scores keep roster order.
fn qualifying_order<R>(roster: &[DriverProfile], config: &SimConfig, rng: &mut R) -> Vec<usize>
where
    R: RaceRng + ?Sized,
{
    let noise = config.qualifying_noise;
    let mut scores: Vec<(usize, f64)> = roster
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.skill * 100.0 + rng.uniform(-noise, noise)))
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores.into_iter().map(|(i, _)| i).collect()
}

/// One driver's lap: either a timed lap or a pit stop.
fn run_lap<R>(
    lap: Lap,
    profile: &DriverProfile,
    state: &mut DriverRaceState,
    base_lap_time: f64,
    config: &SimConfig,
    rng: &mut R,
    events: &mut Vec<RaceEvent>,
) where
    R: RaceRng + ?Sized,
{
    let lap_time = config.clean_lap_time(base_lap_time, profile.skill)
        + rng.uniform(-config.lap_noise, config.lap_noise)
        + config.wear_penalty(state.tyre_age);

    if config.pit_eligible(lap, state.tyre_age) && rng.chance(config.pit_chance) {
        let duration = config.pit_seconds + rng.uniform(-config.pit_jitter, config.pit_jitter);
        events.push(RaceEvent::PitStop {
            driver: state.driver.clone(),
            lap,
            duration,
        });
        state.total_time += lap_time + duration;
        state.tyre_age = 0;
        state.pit_stops += 1;
        state.compound = config.pit_compound.clone();
        // The new stint starts next lap; nothing to announce after the flag.
        if lap < config.laps {
            events.push(RaceEvent::Compound {
                driver: state.driver.clone(),
                lap: lap + 1,
                compound: state.compound.clone(),
            });
        }
    } else {
        events.push(RaceEvent::LapTime {
            driver: state.driver.clone(),
            lap,
            seconds: lap_time,
        });
        state.total_time += lap_time;
        state.tyre_age += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::rng::SimRng;
    use crate::test_utils::{EagerRng, QuietRng, roster};

    fn race() -> RaceSpec {
        RaceSpec {
            race_id: RaceId(1),
            base_lap_time: 90.0,
            name: None,
        }
    }

    fn lap_times(log: &RaceLog, lap: Lap) -> Vec<(String, f64)> {
        log.events()
            .iter()
            .filter_map(|e| match e {
                RaceEvent::LapTime {
                    driver,
                    lap: l,
                    seconds,
                } if *l == lap => Some((driver.to_string(), *seconds)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn driver_state_accumulates_laps_and_stops() {
        let config = SimConfig::default();
        let drivers = roster(&[("VER", 0.5)]);
        let profile = &drivers[0];
        let mut state = DriverRaceState::new(profile.code.clone(), &config.start_compound);
        let mut events = Vec::new();

        run_lap(1, profile, &mut state, 90.0, &config, &mut QuietRng, &mut events);
        let clean = config.clean_lap_time(90.0, 0.5);
        assert!((state.total_time - (clean + config.wear_penalty(0))).abs() < 1e-9);
        assert_eq!(state.tyre_age, 1);

        state.tyre_age = 9;
        let before = state.total_time;
        run_lap(10, profile, &mut state, 90.0, &config, &mut EagerRng, &mut events);
        let expected = clean + config.wear_penalty(9) + config.pit_seconds;
        assert!((state.total_time - before - expected).abs() < 1e-9);
        assert_eq!(state.pit_stops, 1);
        assert_eq!(state.tyre_age, 0);
        assert_eq!(state.compound, "Hard");
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn wear_penalty_is_quadratic_and_increasing() {
        assert_eq!(tyre_wear_penalty(0), 0.0);
        assert_eq!(tyre_wear_penalty(10), 0.5);
        assert_eq!(tyre_wear_penalty(20), 2.0);
        for age in 0..20 {
            assert!(tyre_wear_penalty(age + 1) > tyre_wear_penalty(age));
        }
    }

    #[test]
    fn pit_eligibility_window() {
        let config = SimConfig::default();
        assert!(!config.pit_eligible(7, 20));
        assert!(!config.pit_eligible(10, 8));
        assert!(config.pit_eligible(10, 9));
        assert!(config.pit_eligible(12, 11));
        assert!(!config.pit_eligible(13, 12));
    }

    #[test]
    fn validate_rejects_bad_configs() {
        assert!(SimConfig::default().validate().is_ok());
        assert!(SimConfig::default().with_laps(0).validate().is_err());
        assert!(SimConfig::default().with_pit_window(12, 8).validate().is_err());
        assert!(SimConfig::default().with_overtake_chance(1.5).validate().is_err());
    }

    #[test]
    fn noise_free_race_is_ordered_by_skill() {
        let roster = roster(&[("MID", 0.85), ("TOP", 0.95), ("LOW", 0.78)]);
        let config = SimConfig::default().with_laps(5);
        let log = simulate_race(&race(), &roster, &config, &mut QuietRng).unwrap();

        let grid: Vec<_> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                RaceEvent::Position { driver, lap: 1, rank } => Some((driver.as_str(), *rank)),
                _ => None,
            })
            .collect();
        assert_eq!(grid, vec![("TOP", 1), ("MID", 2), ("LOW", 3)]);

        for lap in 1..=5 {
            let times = lap_times(&log, lap);
            let names: Vec<_> = times.iter().map(|(d, _)| d.as_str()).collect();
            assert_eq!(names, vec!["TOP", "MID", "LOW"]);
            assert!(times[0].1 < times[1].1 && times[1].1 < times[2].1);
        }

        // Deterministic: lap 3 of the top driver is clean time plus wear at age 2.
        let expected = 90.0 / (0.8 + 0.95 * 0.2) + tyre_wear_penalty(2);
        assert!((lap_times(&log, 3)[0].1 - expected).abs() < 1e-9);

        assert!(log.events().iter().all(|e| e.kind() != EventKind::Overtake));
        assert!(log.events().iter().all(|e| e.kind() != EventKind::Pit));
    }

    #[test]
    fn one_lap_or_pit_per_driver_per_lap() {
        let roster = roster(&[("A", 0.9), ("B", 0.88), ("C", 0.8), ("D", 0.79)]);
        let config = SimConfig::default();
        let mut rng = SimRng::new(2024);
        let log = simulate_race(&race(), &roster, &config, &mut rng).unwrap();

        for lap in 1..=config.laps {
            for p in &roster {
                let count = log
                    .events()
                    .iter()
                    .filter(|e| {
                        matches!(e.kind(), EventKind::Lap | EventKind::Pit)
                            && e.lap() == lap
                            && e.driver() == Some(&p.code)
                    })
                    .count();
                assert_eq!(count, 1, "driver {} lap {lap}", p.code);
            }
        }
    }

    #[test]
    fn pits_only_inside_window() {
        let roster = roster(&[("A", 0.9), ("B", 0.88), ("C", 0.8)]);
        let config = SimConfig::default();
        for seed in 0..20 {
            let mut rng = SimRng::new(seed);
            let log = simulate_race(&race(), &roster, &config, &mut rng).unwrap();
            for e in log.events() {
                if e.kind() == EventKind::Pit {
                    assert!((10..=12).contains(&e.lap()), "pit on lap {}", e.lap());
                }
            }
        }
    }

    #[test]
    fn eager_rng_pits_first_eligible_lap_and_swaps_leaders() {
        let roster = roster(&[("A", 0.95), ("B", 0.85)]);
        let config = SimConfig::default().with_laps(12);
        let log = simulate_race(&race(), &roster, &config, &mut EagerRng).unwrap();
        let text = log.to_text();

        // Tyre age reaches 9 on lap 10: both drivers stop, then run a new stint.
        assert!(text.contains("1,10,A,PIT,20.000\n"));
        assert!(text.contains("1,10,B,PIT,20.000\n"));
        assert!(text.contains("1,11,A,COMPOUND,Hard\n"));
        assert!(!text.contains(",11,A,PIT"));

        // Every lap after the first swaps positions 1 and 2.
        assert!(text.contains("1,2,B,OVERTAKE,1\n1,2,B,POS,1\n1,2,A,POS,2\n"));
        assert!(text.contains("1,3,A,OVERTAKE,1\n"));
        let overtakes = log
            .events()
            .iter()
            .filter(|e| e.kind() == EventKind::Overtake)
            .count();
        assert_eq!(overtakes, 11);
    }

    #[test]
    fn session_events_open_the_log() {
        let roster = roster(&[("A", 0.9)]);
        let spec = RaceSpec {
            name: Some("Bahrain".into()),
            ..race()
        };
        let log = simulate_race(&spec, &roster, &SimConfig::default(), &mut QuietRng).unwrap();
        let head: Vec<_> = log.records().take(3).map(|r| r.to_string()).collect();
        assert_eq!(head, vec!["1,0,TRACK,NAME,Bahrain", "1,0,A,COMPOUND,Medium", "1,1,A,POS,1"]);
    }

    #[test]
    fn same_seed_same_race() {
        let roster = roster(&[("A", 0.9), ("B", 0.88), ("C", 0.8)]);
        let config = SimConfig::default();
        let a = simulate_race(&race(), &roster, &config, &mut SimRng::new(9)).unwrap();
        let b = simulate_race(&race(), &roster, &config, &mut SimRng::new(9)).unwrap();
        assert_eq!(a.to_text(), b.to_text());
    }

    #[test]
    fn rejects_empty_roster_and_bad_base_time() {
        let config = SimConfig::default();
        assert_eq!(
            simulate_race(&race(), &[], &config, &mut QuietRng),
            Err(SimError::EmptyRoster(RaceId(1)))
        );
        let bad = RaceSpec {
            base_lap_time: 0.0,
            ..race()
        };
        assert!(matches!(
            simulate_race(&bad, &roster(&[("A", 0.9)]), &config, &mut QuietRng),
            Err(SimError::InvalidBaseLapTime { .. })
        ));
    }

    #[test]
    fn config_overrides_from_partial_toml() {
        let config: SimConfig = toml::from_str("laps = 57\npit_chance = 0.5\n").unwrap();
        assert_eq!(config.laps, 57);
        assert_eq!(config.pit_chance, 0.5);
        assert_eq!(config.overtake_chance, 0.5);
        assert_eq!(config.start_compound, "Medium");
    }
}
