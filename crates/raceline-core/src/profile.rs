//! Driver identity and the profile table consumed by the simulator.
//!
//! Profile table line format (no header):
//!
//! ```text
//! <driver_code>,<display_name>,<team>,<skill 0.00-1.00>,<reference_pit_seconds>
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::DriverCode;
use crate::log::ParseError;

/// Team strength tier, used to pick a reference pit-stop duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TeamTier {
    Front,
    Midfield,
    Back,
    /// Any tier number outside 1..=3.
    Other(u8),
}

impl TeamTier {
    /// Reference pit-stop duration in seconds.
    pub fn pit_seconds(self) -> f64 {
        match self {
            TeamTier::Front => 18.5,
            TeamTier::Midfield => 19.8,
            TeamTier::Back => 21.0,
            TeamTier::Other(_) => 20.0,
        }
    }
}

impl From<u8> for TeamTier {
    fn from(tier: u8) -> Self {
        match tier {
            1 => TeamTier::Front,
            2 => TeamTier::Midfield,
            3 => TeamTier::Back,
            other => TeamTier::Other(other),
        }
    }
}

impl From<TeamTier> for u8 {
    fn from(tier: TeamTier) -> Self {
        match tier {
            TeamTier::Front => 1,
            TeamTier::Midfield => 2,
            TeamTier::Back => 3,
            TeamTier::Other(tier) => tier,
        }
    }
}

/// Static identity of a driver, as kept in the driver database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub code: DriverCode,
    pub name: String,
    pub team: String,
    pub tier: TeamTier,
}

impl DriverInfo {
    /// Placeholder identity for a code missing from the database.
    pub fn unknown(code: DriverCode) -> Self {
        Self {
            name: format!("Driver {code}"),
            code,
            team: "Unknown".to_string(),
            tier: TeamTier::Back,
        }
    }
}

/// A driver ready to race: identity plus normalized skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub code: DriverCode,
    pub name: String,
    pub team: String,
    /// Normalized skill, 0.78 (slowest) to 0.95 (fastest) when derived from
    /// history.
    pub skill: f64,
    /// Reference pit-stop duration in seconds.
    pub pit_seconds: f64,
}

impl DriverProfile {
    pub fn new(info: DriverInfo, skill: f64) -> Self {
        Self {
            pit_seconds: info.tier.pit_seconds(),
            code: info.code,
            name: info.name,
            team: info.team,
            skill,
        }
    }

    /// Parse one line of the profile table.
    pub fn parse_record(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        let field = |i: usize, name: &'static str| {
            fields
                .get(i)
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .ok_or(ParseError::MissingField(name))
        };
        let number = |i: usize, name: &'static str| -> Result<f64, ParseError> {
            let raw = field(i, name)?;
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseError::InvalidNumber {
                    field: name,
                    value: raw.to_string(),
                })
        };

        Ok(Self {
            code: DriverCode::new(field(0, "driver_code")?),
            name: field(1, "display_name")?.to_string(),
            team: field(2, "team")?.to_string(),
            skill: number(3, "skill")?,
            pit_seconds: number(4, "reference_pit_seconds")?,
        })
    }
}

impl fmt::Display for DriverProfile {
    /// Formats the profile table line, skill to two decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{:.2},{:?}",
            self.code, self.name, self.team, self.skill, self.pit_seconds
        )
    }
}
