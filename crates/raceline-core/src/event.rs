//! Typed race events and their sort keys.
//!
//! Every producer (simulator or telemetry mapper) emits [`RaceEvent`]s in
//! derivation order. Each event knows its own [`SortKey`], so ordering a race
//! is a single stable sort over the collected events (see
//! [`crate::log::RaceLog::from_events`]).
//!
//! # Same-lap priority
//!
//! | priority | kinds |
//! |---|---|
//! | [`Priority::Session`] | `NAME`, `WEATHER` |
//! | [`Priority::Tyre`] | `COMPOUND`, `PIT` |
//! | [`Priority::Position`] | `POS`, `OVERTAKE` |
//! | [`Priority::Summary`] | `LAP`, `BATCH` |
//!
//! Replay reads a lap top to bottom: positions never precede the pit/tyre
//! state that caused them, and lap times always close out the lap.

use std::fmt;

use crate::id::{DriverCode, Lap};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A race occurrence. Driver events carry the lap at which they occurred;
/// session metadata always lives on lap 0.
#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    // -- Session --
    TrackName {
        name: String,
    },
    Weather {
        wet: bool,
    },

    // -- Tyres and pit lane --
    Compound {
        driver: DriverCode,
        lap: Lap,
        compound: String,
    },
    PitStop {
        driver: DriverCode,
        lap: Lap,
        duration: f64,
    },

    // -- Positions --
    Position {
        driver: DriverCode,
        lap: Lap,
        rank: u32,
    },
    /// The driver gained a place; `rank` is the position after the pass.
    Overtake {
        driver: DriverCode,
        lap: Lap,
        rank: u32,
    },

    // -- Lap times --
    LapTime {
        driver: DriverCode,
        lap: Lap,
        seconds: f64,
    },
    /// Every driver's raw (not cumulative) lap time for one lap, in rank order.
    LapBatch {
        lap: Lap,
        times: Vec<(DriverCode, f64)>,
    },
}

/// Discriminant tag for event types, used for filtering and the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Name,
    Weather,
    Compound,
    Pit,
    Pos,
    Overtake,
    Lap,
    Batch,
}

/// Relative order of events that share a lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Session = 0,
    Tyre = 1,
    Position = 2,
    Summary = 3,
}

/// Total order of events within one race: lap first, then priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    pub lap: Lap,
    pub priority: Priority,
}

impl RaceEvent {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            RaceEvent::TrackName { .. } => EventKind::Name,
            RaceEvent::Weather { .. } => EventKind::Weather,
            RaceEvent::Compound { .. } => EventKind::Compound,
            RaceEvent::PitStop { .. } => EventKind::Pit,
            RaceEvent::Position { .. } => EventKind::Pos,
            RaceEvent::Overtake { .. } => EventKind::Overtake,
            RaceEvent::LapTime { .. } => EventKind::Lap,
            RaceEvent::LapBatch { .. } => EventKind::Batch,
        }
    }

    pub fn lap(&self) -> Lap {
        match self {
            RaceEvent::TrackName { .. } | RaceEvent::Weather { .. } => 0,
            RaceEvent::Compound { lap, .. }
            | RaceEvent::PitStop { lap, .. }
            | RaceEvent::Position { lap, .. }
            | RaceEvent::Overtake { lap, .. }
            | RaceEvent::LapTime { lap, .. }
            | RaceEvent::LapBatch { lap, .. } => *lap,
        }
    }

    /// The driver this event is about, if it concerns a single driver.
    pub fn driver(&self) -> Option<&DriverCode> {
        match self {
            RaceEvent::Compound { driver, .. }
            | RaceEvent::PitStop { driver, .. }
            | RaceEvent::Position { driver, .. }
            | RaceEvent::Overtake { driver, .. }
            | RaceEvent::LapTime { driver, .. } => Some(driver),
            RaceEvent::TrackName { .. } | RaceEvent::Weather { .. } | RaceEvent::LapBatch { .. } => {
                None
            }
        }
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey {
            lap: self.lap(),
            priority: self.kind().priority(),
        }
    }
}

impl EventKind {
    pub fn priority(self) -> Priority {
        match self {
            EventKind::Name | EventKind::Weather => Priority::Session,
            EventKind::Compound | EventKind::Pit => Priority::Tyre,
            EventKind::Pos | EventKind::Overtake => Priority::Position,
            EventKind::Lap | EventKind::Batch => Priority::Summary,
        }
    }

    /// The `<type>` column of the log format.
    pub fn tag(self) -> &'static str {
        match self {
            EventKind::Name => "NAME",
            EventKind::Weather => "WEATHER",
            EventKind::Compound => "COMPOUND",
            EventKind::Pit => "PIT",
            EventKind::Pos => "POS",
            EventKind::Overtake => "OVERTAKE",
            EventKind::Lap => "LAP",
            EventKind::Batch => "BATCH",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "NAME" => EventKind::Name,
            "WEATHER" => EventKind::Weather,
            "COMPOUND" => EventKind::Compound,
            "PIT" => EventKind::Pit,
            "POS" => EventKind::Pos,
            "OVERTAKE" => EventKind::Overtake,
            "LAP" => EventKind::Lap,
            "BATCH" => EventKind::Batch,
            _ => return None,
        })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Normalize a compound name to the log spelling: first letter upper case,
/// the rest lower case (`SOFT` and `soft` both become `Soft`).
pub fn normalize_compound(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
