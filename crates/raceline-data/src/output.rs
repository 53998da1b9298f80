//! The two generated text files: the driver profile table and the event log.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use raceline_core::event::RaceEvent;
use raceline_core::id::RaceId;
use raceline_core::log::{RaceLog, parse_line};
use raceline_core::profile::DriverProfile;
use raceline_core::season::write_season;
use tracing::{info, warn};

use crate::loader::DataLoadError;

// ===========================================================================
// Profile table
// ===========================================================================

/// Write one profile per line, in the given order.
pub fn write_profiles(path: &Path, profiles: &[DriverProfile]) -> Result<(), DataLoadError> {
    let mut out = BufWriter::new(File::create(path)?);
    for profile in profiles {
        writeln!(out, "{profile}")?;
    }
    out.flush()?;
    info!(file = %path.display(), drivers = profiles.len(), "wrote driver profiles");
    Ok(())
}

/// Read a profile table. Blank lines are ignored; malformed lines are
/// skipped with a warning.
pub fn read_profiles(path: &Path) -> Result<Vec<DriverProfile>, DataLoadError> {
    let reader = BufReader::new(File::open(path)?);
    let mut profiles = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match DriverProfile::parse_record(&line) {
            Ok(profile) => profiles.push(profile),
            Err(err) => warn!(file = %path.display(), line = index + 1, %err, "skipping profile"),
        }
    }
    Ok(profiles)
}

// ===========================================================================
// Event log
// ===========================================================================

/// Write every race log back to back.
pub fn write_event_log(path: &Path, logs: &[RaceLog]) -> Result<(), DataLoadError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_season(logs, &mut out)?;
    out.flush()?;
    let events: usize = logs.iter().map(RaceLog::len).sum();
    info!(file = %path.display(), races = logs.len(), events, "wrote event log");
    Ok(())
}

/// Read an event log back, one [`RaceLog`] per run of consecutive lines with
/// the same race id. Events keep their file order so it can be validated.
pub fn read_event_log(path: &Path) -> Result<Vec<RaceLog>, DataLoadError> {
    let reader = BufReader::new(File::open(path)?);
    let mut logs = Vec::new();
    let mut current: Option<(RaceId, Vec<RaceEvent>)> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (race, event) = parse_line(&line).map_err(|source| DataLoadError::Record {
            file: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        match &mut current {
            Some((id, events)) if *id == race => events.push(event),
            _ => {
                if let Some((id, events)) = current.replace((race, vec![event])) {
                    logs.push(RaceLog::as_recorded(id, events));
                }
            }
        }
    }
    if let Some((id, events)) = current {
        logs.push(RaceLog::as_recorded(id, events));
    }
    Ok(logs)
}
