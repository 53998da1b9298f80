pub mod loader;
pub mod output;
pub mod pipeline;
pub mod race_dir;
pub mod schema;
pub mod table;

pub use loader::DataLoadError;
pub use pipeline::{derive_profiles, map_telemetry};
pub use schema::{DriverDb, SeasonConfig};
