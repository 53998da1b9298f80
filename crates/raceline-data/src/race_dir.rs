//! Telemetry directory discovery and typed table readers.
//!
//! A telemetry directory holds up to three CSV files per race, all named
//! after the race:
//!
//! - `<Race>_lap_times.csv`: `LapNumber`, `Driver`, `LapTimeSeconds`
//! - `<Race>_stints.csv`: `Driver`, `Compound`, `StartLap`, optional
//!   `PitDuration`
//! - `<Race>_driver_summary.csv`: `Driver`, `AvgLapTime`, optional `Weather`
//!
//! Races are discovered from the lap-time files, sorted by name and numbered
//! from 1. Missing stint or summary files read as empty tables.

use std::path::{Path, PathBuf};

use raceline_core::id::{DriverCode, RaceId};
use raceline_core::telemetry::{LapRow, RaceTables, StintRow, SummaryRow, TelemetryRace};
use tracing::{debug, info, warn};

use crate::loader::DataLoadError;
use crate::table::{Columns, CsvTable, cell, number, whole_number};

pub const LAP_TIMES_SUFFIX: &str = "_lap_times.csv";
pub const STINTS_SUFFIX: &str = "_stints.csv";
pub const SUMMARY_SUFFIX: &str = "_driver_summary.csv";

/// The files of one discovered race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceFiles {
    pub race_id: RaceId,
    pub name: String,
    pub lap_times: PathBuf,
    pub stints: PathBuf,
    pub summary: PathBuf,
}

// ===========================================================================
// Discovery
// ===========================================================================

/// Race names of every file in `dir` ending in `suffix`, sorted.
fn names_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<String>, DataLoadError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry
            .file_name()
            .to_str()
            .and_then(|file| file.strip_suffix(suffix))
            .filter(|name| !name.is_empty())
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Find every race in a telemetry directory.
pub fn discover_races(dir: &Path) -> Result<Vec<RaceFiles>, DataLoadError> {
    let races: Vec<RaceFiles> = names_with_suffix(dir, LAP_TIMES_SUFFIX)?
        .into_iter()
        .enumerate()
        .map(|(i, name)| RaceFiles {
            race_id: RaceId(i as u32 + 1),
            lap_times: dir.join(format!("{name}{LAP_TIMES_SUFFIX}")),
            stints: dir.join(format!("{name}{STINTS_SUFFIX}")),
            summary: dir.join(format!("{name}{SUMMARY_SUFFIX}")),
            name,
        })
        .collect();
    debug!(dir = %dir.display(), races = races.len(), "discovered races");
    Ok(races)
}

// ===========================================================================
// Typed readers
// ===========================================================================

/// Lap rows. Rows without a usable lap number or driver are dropped; a
/// non-numeric lap time is kept as `None`.
pub fn lap_rows(table: &CsvTable, file: &Path) -> Result<Vec<LapRow>, DataLoadError> {
    let cols = Columns::new(table, file);
    let (lap_col, driver_col, time_col) = (
        cols.required("LapNumber")?,
        cols.required("Driver")?,
        cols.required("LapTimeSeconds")?,
    );

    let mut dropped = 0usize;
    let mut rows = Vec::with_capacity(table.len());
    for row in table.rows() {
        let driver = cell(row, driver_col);
        match whole_number(row, lap_col) {
            Some(lap) if !driver.is_empty() => rows.push(LapRow {
                lap,
                driver: DriverCode::from(driver),
                lap_time: number(row, time_col),
            }),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(file = %file.display(), dropped, "dropped lap rows without lap number or driver");
    }
    Ok(rows)
}

/// Stint rows. Rows without a usable start lap or driver are dropped.
pub fn stint_rows(table: &CsvTable, file: &Path) -> Result<Vec<StintRow>, DataLoadError> {
    let cols = Columns::new(table, file);
    let (driver_col, compound_col, start_col) = (
        cols.required("Driver")?,
        cols.required("Compound")?,
        cols.required("StartLap")?,
    );
    let pit_col = cols.optional("PitDuration");

    let mut dropped = 0usize;
    let mut rows = Vec::with_capacity(table.len());
    for row in table.rows() {
        let driver = cell(row, driver_col);
        match whole_number(row, start_col) {
            Some(start_lap) if !driver.is_empty() => rows.push(StintRow {
                driver: DriverCode::from(driver),
                compound: cell(row, compound_col).to_string(),
                start_lap,
                pit_duration: pit_col.and_then(|c| number(row, c)),
            }),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(file = %file.display(), dropped, "dropped stint rows without start lap or driver");
    }
    Ok(rows)
}

/// Summary rows. A non-numeric average reads as `None`; a blank weather
/// cell or missing `Weather` column reads as `None`.
pub fn summary_rows(table: &CsvTable, file: &Path) -> Result<Vec<SummaryRow>, DataLoadError> {
    let cols = Columns::new(table, file);
    let (driver_col, avg_col) = (cols.required("Driver")?, cols.required("AvgLapTime")?);
    let weather_col = cols.optional("Weather");

    Ok(table
        .rows()
        .iter()
        .filter(|row| !cell(row, driver_col).is_empty())
        .map(|row| SummaryRow {
            driver: DriverCode::from(cell(row, driver_col)),
            avg_lap_time: number(row, avg_col),
            weather: weather_col
                .map(|c| cell(row, c))
                .filter(|w| !w.is_empty())
                .map(str::to_string),
        })
        .collect())
}

/// Read an optional table: a missing file, or one without the required
/// columns, is empty.
fn optional_table<T>(
    path: &Path,
    read: fn(&CsvTable, &Path) -> Result<Vec<T>, DataLoadError>,
) -> Result<Vec<T>, DataLoadError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let table = CsvTable::read(path)?;
    match read(&table, path) {
        Err(err @ DataLoadError::MissingColumn { .. }) => {
            warn!(%err, "ignoring table");
            Ok(Vec::new())
        }
        other => other,
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load the three tables of one race. The lap-time table is required.
pub fn load_race(files: &RaceFiles) -> Result<TelemetryRace, DataLoadError> {
    let laps = lap_rows(&CsvTable::read(&files.lap_times)?, &files.lap_times)?;
    let stints = optional_table(&files.stints, stint_rows)?;
    let summary = optional_table(&files.summary, summary_rows)?;
    Ok(TelemetryRace {
        race_id: files.race_id,
        name: files.name.clone(),
        tables: RaceTables {
            laps,
            stints,
            summary,
        },
    })
}

/// Load every race of a telemetry directory. Races that fail to load are
/// skipped with a warning; ids stay as discovered so they do not shift.
pub fn load_telemetry(dir: &Path) -> Result<Vec<TelemetryRace>, DataLoadError> {
    let mut races = Vec::new();
    for files in discover_races(dir)? {
        match load_race(&files) {
            Ok(race) => races.push(race),
            Err(err) => warn!(race = %files.name, %err, "skipping race"),
        }
    }
    if races.is_empty() {
        return Err(DataLoadError::NoRaces {
            dir: dir.to_path_buf(),
        });
    }
    info!(dir = %dir.display(), races = races.len(), "loaded telemetry");
    Ok(races)
}

/// Load every driver summary in a directory, for skill normalization.
/// Unreadable summaries are skipped with a warning.
pub fn load_summaries(dir: &Path) -> Result<Vec<(String, Vec<SummaryRow>)>, DataLoadError> {
    let mut summaries = Vec::new();
    for name in names_with_suffix(dir, SUMMARY_SUFFIX)? {
        let path = dir.join(format!("{name}{SUMMARY_SUFFIX}"));
        let rows = CsvTable::read(&path).and_then(|table| summary_rows(&table, &path));
        match rows {
            Ok(rows) => summaries.push((name, rows)),
            Err(err) => warn!(file = %path.display(), %err, "skipping summary"),
        }
    }
    info!(dir = %dir.display(), files = summaries.len(), "loaded race summaries");
    Ok(summaries)
}
