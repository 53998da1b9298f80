//! Serde structs for the season config and the driver database.
//!
//! Both are read from RON, JSON, or TOML through the loader. A season
//! config looks like this in TOML:
//!
//! ```toml
//! seed = 2024
//!
//! [sim]
//! laps = 57
//!
//! [[races]]
//! race_id = 1
//! base_lap_time = 92.0
//! name = "Bahrain"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use raceline_core::id::DriverCode;
use raceline_core::profile::DriverInfo;
use raceline_core::simulate::{RaceSpec, SimConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::loader::{
    DataLoadError, Format, deserialize_file, deserialize_list, deserialize_str, resolve_data_file,
};

// ===========================================================================
// Season config
// ===========================================================================

/// Everything needed to simulate a season apart from the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// Season seed; each race derives its own stream from it.
    #[serde(default)]
    pub seed: u64,
    /// Race model overrides; unspecified fields keep their defaults.
    #[serde(default)]
    pub sim: SimConfig,
    pub races: Vec<RaceSpec>,
}

impl SeasonConfig {
    /// Load a season config and reject duplicate race ids.
    ///
    /// `path` may be a directory holding `season.{ron,toml,json}`.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let path = resolve_data_file(path, "season")?;
        let config: Self = deserialize_file(&path)?;
        let mut seen = HashSet::new();
        for race in &config.races {
            if !seen.insert(race.race_id) {
                return Err(DataLoadError::Parse {
                    file: path.clone(),
                    detail: format!("duplicate race_id {}", race.race_id),
                });
            }
        }
        Ok(config)
    }
}

// ===========================================================================
// Driver database
// ===========================================================================

const BUILTIN_DRIVERS: &str = include_str!("../data/driver_db.toml");

#[derive(Deserialize)]
struct DriverDbFile {
    drivers: Vec<DriverInfo>,
}

/// Static driver identities keyed by code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverDb {
    drivers: BTreeMap<DriverCode, DriverInfo>,
}

impl DriverDb {
    /// Build from a list; a repeated code replaces the earlier entry.
    pub fn from_list(list: Vec<DriverInfo>) -> Self {
        let mut drivers = BTreeMap::new();
        for info in list {
            let code = info.code.clone();
            if drivers.insert(code.clone(), info).is_some() {
                warn!(%code, "duplicate driver in database, keeping the last entry");
            }
        }
        Self { drivers }
    }

    /// Load a driver list (`drivers` array in TOML, a bare list otherwise).
    ///
    /// `path` may be a directory holding `drivers.{ron,toml,json}`.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let path = resolve_data_file(path, "drivers")?;
        Ok(Self::from_list(deserialize_list(&path, "drivers")?))
    }

    /// The bundled database of the current grid.
    pub fn builtin() -> Result<Self, DataLoadError> {
        let file: DriverDbFile =
            deserialize_str(BUILTIN_DRIVERS, Format::Toml, Path::new("driver_db.toml"))?;
        Ok(Self::from_list(file.drivers))
    }

    pub fn get(&self, code: &DriverCode) -> Option<&DriverInfo> {
        self.drivers.get(code)
    }

    /// The stored identity, or a placeholder for unknown codes.
    pub fn lookup(&self, code: &DriverCode) -> DriverInfo {
        self.get(code)
            .cloned()
            .unwrap_or_else(|| DriverInfo::unknown(code.clone()))
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raceline_core::id::RaceId;
    use raceline_core::profile::TeamTier;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "raceline_schema_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn builtin_db_covers_the_grid() {
        let db = DriverDb::builtin().unwrap();
        assert_eq!(db.len(), 24);
        let ver = db.lookup(&DriverCode::from("VER"));
        assert_eq!(ver.name, "Max Verstappen");
        assert_eq!(ver.tier, TeamTier::Front);
        assert_eq!(db.lookup(&DriverCode::from("ALO")).tier.pit_seconds(), 19.8);
    }

    #[test]
    fn unknown_codes_get_placeholders() {
        let db = DriverDb::default();
        let info = db.lookup(&DriverCode::from("XYZ"));
        assert_eq!(info.name, "Driver XYZ");
        assert_eq!(info.team, "Unknown");
        assert_eq!(info.tier, TeamTier::Back);
    }

    #[test]
    fn later_entries_win() {
        let entry = |team: &str| DriverInfo {
            code: DriverCode::from("LAW"),
            name: "Liam Lawson".into(),
            team: team.into(),
            tier: TeamTier::Midfield,
        };
        let db = DriverDb::from_list(vec![entry("RB"), entry("Red Bull")]);
        assert_eq!(db.len(), 1);
        assert_eq!(db.lookup(&DriverCode::from("LAW")).team, "Red Bull");
    }

    #[test]
    fn season_from_toml_keeps_sim_defaults() {
        let dir = make_test_dir("season_toml");
        let path = dir.join("season.toml");
        fs::write(
            &path,
            "seed = 7\n[sim]\nlaps = 30\n\n[[races]]\nrace_id = 1\nbase_lap_time = 92.0\nname = \"Bahrain\"\n\n[[races]]\nrace_id = 2\nbase_lap_time = 88.0\n",
        )
        .unwrap();

        let season = SeasonConfig::load(&path).unwrap();
        assert_eq!(season.seed, 7);
        assert_eq!(season.sim.laps, 30);
        assert_eq!(season.sim.pit_chance, 0.3);
        assert_eq!(season.races[0].name.as_deref(), Some("Bahrain"));
        assert_eq!(season.races[1].race_id, RaceId(2));
        assert_eq!(season.races[1].name, None);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn season_from_ron_and_json() {
        let dir = make_test_dir("season_formats");
        let ron_path = dir.join("season.ron");
        fs::write(
            &ron_path,
            "(seed: 3, races: [(race_id: 4, base_lap_time: 80.0, name: Some(\"Australia\"))])",
        )
        .unwrap();
        let json_path = dir.join("season.json");
        fs::write(
            &json_path,
            r#"{"races": [{"race_id": 5, "base_lap_time": 90.0}], "sim": {"overtake_chance": 0.1}}"#,
        )
        .unwrap();

        let ron = SeasonConfig::load(&ron_path).unwrap();
        assert_eq!(ron.seed, 3);
        assert_eq!(ron.sim, SimConfig::default());
        assert_eq!(ron.races[0].name.as_deref(), Some("Australia"));

        let json = SeasonConfig::load(&json_path).unwrap();
        assert_eq!(json.seed, 0);
        assert_eq!(json.sim.overtake_chance, 0.1);
        assert_eq!(json.sim.laps, 20);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_race_ids_are_rejected() {
        let dir = make_test_dir("season_dup");
        let path = dir.join("season.json");
        fs::write(
            &path,
            r#"{"races": [{"race_id": 1, "base_lap_time": 90.0}, {"race_id": 1, "base_lap_time": 91.0}]}"#,
        )
        .unwrap();
        assert!(matches!(
            SeasonConfig::load(&path),
            Err(DataLoadError::Parse { detail, .. }) if detail.contains("duplicate")
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn driver_db_from_directory() {
        let dir = make_test_dir("db_dir");
        fs::write(
            dir.join("drivers.toml"),
            "[[drivers]]\ncode = \"DOO\"\nname = \"Jack Doohan\"\nteam = \"Alpine\"\ntier = 4\n",
        )
        .unwrap();

        let db = DriverDb::load(&dir).unwrap();
        let doo = db.lookup(&DriverCode::from("DOO"));
        assert_eq!(doo.tier, TeamTier::Other(4));
        assert_eq!(doo.tier.pit_seconds(), 20.0);

        fs::write(dir.join("drivers.json"), "[]").unwrap();
        assert!(matches!(
            DriverDb::load(&dir),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn season_from_directory() {
        let dir = make_test_dir("season_dir");
        assert!(matches!(
            SeasonConfig::load(&dir),
            Err(DataLoadError::MissingRequired { .. })
        ));
        fs::write(
            dir.join("season.ron"),
            "(races: [(race_id: 9, base_lap_time: 95.0, name: None)])",
        )
        .unwrap();
        let season = SeasonConfig::load(&dir).unwrap();
        assert_eq!(season.races[0].race_id, RaceId(9));
        let _ = fs::remove_dir_all(&dir);
    }
}
