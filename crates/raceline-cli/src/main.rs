//! Raceline CLI
//!
//! Derives driver profiles and race event logs from lap telemetry, or
//! simulates a season from a profile table, and checks finished logs.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use raceline_core::id::DriverCode;
use raceline_core::season::simulate_season;
use raceline_core::validation::{lap_totals, validate_log};
use raceline_data::output::{read_event_log, read_profiles, write_event_log, write_profiles};
use raceline_data::{DriverDb, SeasonConfig, derive_profiles, map_telemetry};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "raceline")]
#[command(about = "Race event log derivation from simulations or lap telemetry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize driver skills from race summaries into a profile table
    Profiles {
        /// Directory holding `<Race>_driver_summary.csv` files
        #[arg(long)]
        telemetry: PathBuf,

        /// Driver database file, or a directory holding `drivers.{ron,toml,json}`;
        /// the bundled grid if omitted
        #[arg(long)]
        drivers: Option<PathBuf>,

        /// Output profile table
        #[arg(long, default_value = "drivers.txt")]
        out: PathBuf,
    },

    /// Simulate a season from a profile table
    Simulate {
        /// Season config file, or a directory holding `season.{ron,toml,json}`
        #[arg(long)]
        season: PathBuf,

        /// Profile table written by `profiles`
        #[arg(long)]
        profiles: PathBuf,

        /// Override the season seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output event log
        #[arg(long, default_value = "race_events.txt")]
        out: PathBuf,
    },

    /// Map recorded lap telemetry into an event log
    Events {
        /// Directory holding the per-race CSV tables
        #[arg(long)]
        telemetry: PathBuf,

        /// Output event log
        #[arg(long, default_value = "race_events.txt")]
        out: PathBuf,
    },

    /// Check an event log and report per-driver lap totals
    Verify {
        /// Event log to check
        #[arg(long)]
        log: PathBuf,

        /// Only report totals for this driver
        #[arg(long)]
        driver: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Profiles {
            telemetry,
            drivers,
            out,
        } => {
            let db = match drivers {
                Some(path) => DriverDb::load(&path)?,
                None => DriverDb::builtin()?,
            };
            let profiles = derive_profiles(&telemetry, &db)?;
            for profile in &profiles {
                info!(driver = %profile.code, skill = profile.skill, team = %profile.team, "profile");
            }
            write_profiles(&out, &profiles)?;
        }

        Commands::Simulate {
            season,
            profiles,
            seed,
            out,
        } => {
            let season = SeasonConfig::load(&season)?;
            let roster = read_profiles(&profiles)?;
            let seed = seed.unwrap_or(season.seed);
            let logs = simulate_season(&season.races, &roster, &season.sim, seed)?;
            write_event_log(&out, &logs)?;
        }

        Commands::Events { telemetry, out } => {
            let logs = map_telemetry(&telemetry)?;
            write_event_log(&out, &logs)?;
        }

        Commands::Verify { log, driver } => {
            let violations = verify(&log, driver.map(DriverCode::new).as_ref())?;
            if violations > 0 {
                return Err(format!("{violations} violation(s) in {}", log.display()).into());
            }
        }
    }

    Ok(())
}

/// Print a report for every race in the log; returns the violation count.
fn verify(path: &Path, only: Option<&DriverCode>) -> Result<usize, Box<dyn std::error::Error>> {
    let logs = read_event_log(path)?;
    let mut violations = 0;

    for log in &logs {
        let found = validate_log(log);
        println!(
            "race {}: {} events, {} laps, {} violation(s)",
            log.race_id(),
            log.len(),
            log.last_lap(),
            found.len()
        );
        for violation in &found {
            warn!(race = %log.race_id(), %violation, "invariant broken");
            println!("  {violation}");
        }
        violations += found.len();

        for (driver, totals) in lap_totals(log) {
            if only.is_some_and(|code| *code != driver) {
                continue;
            }
            println!(
                "  {driver}: {} laps, total {:.4} s",
                totals.laps, totals.time
            );
        }
    }

    info!(races = logs.len(), violations, "verified event log");
    Ok(violations)
}
