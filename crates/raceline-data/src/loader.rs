//! Multi-format config loading: format detection (RON/TOML/JSON), file
//! discovery, and deserialization helpers shared by the season config and
//! the driver database.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while reading input files.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A CSV table is missing a column every row needs.
    #[error("{file} has no '{column}' column")]
    MissingColumn { file: PathBuf, column: &'static str },

    /// A telemetry directory holds no lap-time tables.
    #[error("no race telemetry found in {dir}")]
    NoRaces { dir: PathBuf },

    /// No summary in a directory yielded a usable average lap time.
    #[error("no driver data in {dir}")]
    NoDriverData { dir: PathBuf },

    /// A line of a generated text file could not be read back.
    #[error("{file}:{line}: {source}")]
    Record {
        file: PathBuf,
        line: usize,
        source: raceline_core::log::ParseError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a config file with the given base name.
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = &found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// A file path is used as given; a directory is searched for
/// `{base_name}.{ron,toml,json}`, which must exist exactly once.
pub fn resolve_data_file(path: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    if path.is_dir() {
        require_data_file(path, base_name)
    } else {
        Ok(path.to_path_buf())
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize text in the given format. `origin` only labels errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parse = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize a list from a file. TOML has no top-level arrays, so the list
/// is read from `toml_key` of the root table; RON and JSON hold a bare list.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    if format != Format::Toml {
        return deserialize_str(&content, format, path);
    }

    let parse = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    let table: toml::Table = toml::from_str(&content).map_err(|e| parse(e.to_string()))?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse(format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse(e.to_string()))
}
