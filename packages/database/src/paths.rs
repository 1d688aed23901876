#![allow(clippy::module_name_repetitions)]
//! Default file locations.
//!
//! Everything lives under a single data directory, `./data` unless
//! `PDF_FIELDS_DATA_DIR` says otherwise. The database and pattern file can
//! each be pointed elsewhere with `PDF_FIELDS_DB` and `PDF_FIELDS_PATTERNS`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PDF_FIELDS_DATA_DIR";

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "PDF_FIELDS_DB";

/// Environment variable overriding the pattern file path.
pub const PATTERNS_PATH_ENV: &str = "PDF_FIELDS_PATTERNS";

/// Returns the data directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(|| PathBuf::from("data"), PathBuf::from)
}

/// Returns the `DuckDB` file holding document text and extracted fields.
#[must_use]
pub fn db_path() -> PathBuf {
    std::env::var_os(DB_PATH_ENV)
        .map_or_else(|| data_dir().join("extracted_data.duckdb"), PathBuf::from)
}

/// Returns the pattern configuration file.
#[must_use]
pub fn patterns_path() -> PathBuf {
    std::env::var_os(PATTERNS_PATH_ENV)
        .map_or_else(|| data_dir().join("patterns.json"), PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
