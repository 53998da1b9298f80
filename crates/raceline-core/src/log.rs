//! The per-race event log and its line format.
//!
//! A [`RaceLog`] is built once from a producer's events, sorted once, and
//! never mutated afterwards. Serialization writes one record per line:
//!
//! ```text
//! <race_id>,<lap>,<subject>,<type>,<value>
//! BATCH,<race_id>,<lap>,<driver1>:<time1>,<driver2>:<time2>,...
//! ```
//!
//! Subjects are a driver code or the session marker `TRACK`.

use std::fmt;
use std::io::{self, Write};

use crate::event::{EventKind, RaceEvent};
use crate::id::{DriverCode, Lap, RaceId};
use crate::order::sort_events;

/// Session marker used as the subject of `NAME` and `WEATHER` records.
pub const TRACK_SUBJECT: &str = "TRACK";

/// Leading marker of a batch record.
pub const BATCH_MARKER: &str = "BATCH";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from reading a log line back into an event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unknown event type '{0}'")]
    UnknownType(String),

    #[error("{kind} record must have subject {expected}, got '{subject}'")]
    UnexpectedSubject {
        kind: EventKind,
        expected: &'static str,
        subject: String,
    },

    #[error("session record on lap {0}, expected lap 0")]
    SessionOffLapZero(Lap),

    #[error("malformed batch entry '{0}'")]
    BadBatchEntry(String),
}

// ---------------------------------------------------------------------------
// RaceLog
// ---------------------------------------------------------------------------

/// All events of one race in `(lap, priority)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceLog {
    race_id: RaceId,
    events: Vec<RaceEvent>,
}

impl RaceLog {
    /// Build a log from events in producer order. Performs the single stable
    /// sort; equal keys keep the order they were emitted in.
    pub fn from_events(race_id: RaceId, mut events: Vec<RaceEvent>) -> Self {
        sort_events(&mut events);
        Self { race_id, events }
    }

    /// Wrap events exactly as recorded (e.g. read back from a file) without
    /// sorting, so their order can be validated.
    pub fn as_recorded(race_id: RaceId, events: Vec<RaceEvent>) -> Self {
        Self { race_id, events }
    }

    pub fn race_id(&self) -> RaceId {
        self.race_id
    }

    pub fn events(&self) -> &[RaceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Highest lap number mentioned in the log.
    pub fn last_lap(&self) -> Lap {
        self.events.iter().map(RaceEvent::lap).max().unwrap_or(0)
    }

    /// Formatted records, one per event.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.events.iter().map(move |event| Record {
            race_id: self.race_id,
            event,
        })
    }

    /// Write every record followed by a newline.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for record in self.records() {
            writeln!(out, "{record}")?;
        }
        Ok(())
    }

    /// Render the whole log as newline-terminated text.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for record in self.records() {
            text.push_str(&record.to_string());
            text.push('\n');
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// One event paired with its race id, displayed in the log line format.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub race_id: RaceId,
    pub event: &'a RaceEvent,
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let race = self.race_id;
        let kind = self.event.kind();
        match self.event {
            RaceEvent::TrackName { name } => write!(f, "{race},0,{TRACK_SUBJECT},{kind},{name}"),
            RaceEvent::Weather { wet } => {
                let flag = if *wet { 1.0 } else { 0.0 };
                write!(f, "{race},0,{TRACK_SUBJECT},{kind},{}", Seconds(flag))
            }
            RaceEvent::Compound {
                driver,
                lap,
                compound,
            } => write!(f, "{race},{lap},{driver},{kind},{compound}"),
            RaceEvent::PitStop {
                driver,
                lap,
                duration,
            } => write!(f, "{race},{lap},{driver},{kind},{duration:.3}"),
            RaceEvent::LapTime {
                driver,
                lap,
                seconds,
            } => write!(f, "{race},{lap},{driver},{kind},{seconds:.3}"),
            RaceEvent::Position { driver, lap, rank }
            | RaceEvent::Overtake { driver, lap, rank } => {
                write!(f, "{race},{lap},{driver},{kind},{rank}")
            }
            RaceEvent::LapBatch { lap, times } => {
                write!(f, "{BATCH_MARKER},{race},{lap}")?;
                for (driver, time) in times {
                    write!(f, ",{driver}:{}", Seconds(*time))?;
                }
                Ok(())
            }
        }
    }
}

/// Shortest round-trip rendering of a float that always keeps a decimal
/// point (`90` prints as `90.0`) and never switches to exponent notation.
struct Seconds(f64);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() && self.0.fract() == 0.0 {
            write!(f, "{}.0", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one log line back into its race id and event.
pub fn parse_line(line: &str) -> Result<(RaceId, RaceEvent), ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix("BATCH,") {
        return parse_batch(rest);
    }

    let mut fields = line.splitn(5, ',');
    let race_id = RaceId(parse_u32(fields.next(), "race_id")?);
    let lap = parse_u32(fields.next(), "lap")?;
    let subject = fields.next().ok_or(ParseError::MissingField("subject"))?;
    let tag = fields.next().ok_or(ParseError::MissingField("type"))?;
    let value = fields.next().ok_or(ParseError::MissingField("value"))?;

    let kind = EventKind::from_tag(tag).ok_or_else(|| ParseError::UnknownType(tag.to_string()))?;
    let driver = || DriverCode::new(subject);

    let event = match kind {
        EventKind::Name | EventKind::Weather => {
            if subject != TRACK_SUBJECT {
                return Err(ParseError::UnexpectedSubject {
                    kind,
                    expected: TRACK_SUBJECT,
                    subject: subject.to_string(),
                });
            }
            if lap != 0 {
                return Err(ParseError::SessionOffLapZero(lap));
            }
            if kind == EventKind::Name {
                RaceEvent::TrackName {
                    name: value.to_string(),
                }
            } else {
                RaceEvent::Weather {
                    wet: parse_f64(value, "weather")? != 0.0,
                }
            }
        }
        EventKind::Compound => RaceEvent::Compound {
            driver: driver(),
            lap,
            compound: value.to_string(),
        },
        EventKind::Pit => RaceEvent::PitStop {
            driver: driver(),
            lap,
            duration: parse_f64(value, "pit duration")?,
        },
        EventKind::Lap => RaceEvent::LapTime {
            driver: driver(),
            lap,
            seconds: parse_f64(value, "lap time")?,
        },
        EventKind::Pos => RaceEvent::Position {
            driver: driver(),
            lap,
            rank: parse_u32(Some(value), "rank")?,
        },
        EventKind::Overtake => RaceEvent::Overtake {
            driver: driver(),
            lap,
            rank: parse_u32(Some(value), "rank")?,
        },
        EventKind::Batch => {
            return Err(ParseError::UnexpectedSubject {
                kind,
                expected: BATCH_MARKER,
                subject: subject.to_string(),
            });
        }
    };
    Ok((race_id, event))
}

fn parse_batch(rest: &str) -> Result<(RaceId, RaceEvent), ParseError> {
    let mut fields = rest.split(',');
    let race_id = RaceId(parse_u32(fields.next(), "race_id")?);
    let lap = parse_u32(fields.next(), "lap")?;
    let mut times = Vec::new();
    for entry in fields.filter(|f| !f.is_empty()) {
        let (driver, time) = entry
            .rsplit_once(':')
            .ok_or_else(|| ParseError::BadBatchEntry(entry.to_string()))?;
        times.push((DriverCode::new(driver), parse_f64(time, "batch lap time")?));
    }
    Ok((race_id, RaceEvent::LapBatch { lap, times }))
}

fn parse_u32(field: Option<&str>, name: &'static str) -> Result<u32, ParseError> {
    let raw = field.ok_or(ParseError::MissingField(name))?;
    raw.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field: name,
        value: raw.to_string(),
    })
}

fn parse_f64(raw: &str, name: &'static str) -> Result<f64, ParseError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber {
            field: name,
            value: raw.to_string(),
        }),
    }
}
