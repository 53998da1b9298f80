//! Criterion benchmarks for race log derivation.
//!
//! Three benchmark groups:
//! - `season`: a 24-race, 20-driver, 57-lap simulated season
//! - `telemetry`: mapping one 20-driver, 57-lap race from lap tables
//! - `format`: rendering and re-parsing a full race log

use criterion::{Criterion, criterion_group, criterion_main};
use raceline_core::id::RaceId;
use raceline_core::log::parse_line;
use raceline_core::rng::SimRng;
use raceline_core::season::simulate_season;
use raceline_core::simulate::{RaceSpec, SimConfig, simulate_race};
use raceline_core::telemetry::{LapRow, RaceTables, map_race};
use raceline_core::test_utils::*;

// ===========================================================================
// Builders
// ===========================================================================

const LAPS: u32 = 57;

fn calendar() -> Vec<RaceSpec> {
    (1..=24)
        .map(|id| RaceSpec {
            race_id: RaceId(id),
            base_lap_time: 80.0 + f64::from(id % 7) * 2.5,
            name: Some(format!("Round {id}")),
        })
        .collect()
}

/// Lap tables with a deterministic spread so positions keep changing.
fn lap_table() -> RaceTables {
    let grid = full_grid();
    let mut rng = SimRng::new(11);
    let mut laps = Vec::with_capacity(grid.len() * LAPS as usize);
    for lap in 1..=LAPS {
        for profile in &grid {
            laps.push(LapRow {
                lap,
                driver: profile.code.clone(),
                lap_time: Some(88.0 + rng.next_f64() * 3.0),
            });
        }
    }
    RaceTables {
        laps,
        ..Default::default()
    }
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_season(c: &mut Criterion) {
    let mut group = c.benchmark_group("season");
    group.sample_size(20);

    let races = calendar();
    let grid = full_grid();
    let config = SimConfig::default().with_laps(LAPS);

    group.bench_function("24_races_20_drivers_57_laps", |b| {
        b.iter(|| simulate_season(&races, &grid, &config, 2024).unwrap());
    });

    group.finish();
}

fn bench_telemetry(c: &mut Criterion) {
    let mut group = c.benchmark_group("telemetry");
    group.sample_size(50);

    let tables = lap_table();

    group.bench_function("map_20_drivers_57_laps", |b| {
        b.iter(|| map_race(RaceId(1), "Bench", &tables));
    });

    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    group.sample_size(50);

    let race = &calendar()[0];
    let config = SimConfig::default().with_laps(LAPS);
    let log = simulate_race(race, &full_grid(), &config, &mut SimRng::new(5)).unwrap();
    let text = log.to_text();

    group.bench_function("render_race_log", |b| {
        b.iter(|| log.to_text());
    });

    group.bench_function("parse_race_log", |b| {
        b.iter(|| {
            for line in text.lines() {
                parse_line(line).unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_season, bench_telemetry, bench_format);
criterion_main!(benches);
