#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pattern configuration store.
//!
//! The pattern set lives in a human-editable file, either JSON (the
//! default, a flat object of field name to regex) or TOML (a flat table).
//! The format is picked from the file extension. Field order in the file
//! is preserved through load and save.
//!
//! Patterns are not compiled on load; [`validate`] reports the ones that
//! would fail so callers can warn before saving.

use std::path::Path;

use pdf_fields_engine::CompiledPatterns;
use pdf_fields_engine_models::{FieldError, PatternSet};
use serde::Serialize as _;
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors from reading or writing a pattern file.
#[derive(Debug, thiserror::Error)]
pub enum PatternsError {
    /// The file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents are not a flat map of strings.
    #[error("Failed to parse pattern file {path}: {message}")]
    Parse {
        /// File being parsed.
        path: String,
        /// Parser message.
        message: String,
    },

    /// The pattern set could not be serialized.
    #[error("Failed to serialize patterns: {0}")]
    Serialize(String),

    /// The file extension does not name a supported format.
    #[error("Unsupported pattern file extension: {0}")]
    UnsupportedFormat(String),
}

/// On-disk format of a pattern file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PatternFormat {
    /// `{"Field": "regex", ...}`
    Json,
    /// `Field = 'regex'`
    Toml,
}

impl PatternFormat {
    /// Picks the format from `path`'s extension. Files without an
    /// extension are treated as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, PatternsError> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(Self::Json),
            Some(ext) => ext
                .to_ascii_lowercase()
                .parse()
                .map_err(|_| PatternsError::UnsupportedFormat(ext.to_owned())),
        }
    }
}

/// Parses pattern file contents.
///
/// # Errors
///
/// Returns [`PatternsError::Parse`] if `contents` is not a flat map of
/// string keys to string values.
pub fn parse_str(contents: &str, format: PatternFormat) -> Result<PatternSet, PatternsError> {
    let parsed = match format {
        PatternFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        PatternFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| PatternsError::Parse {
        path: String::from("<string>"),
        message,
    })
}

/// Renders a pattern set in the given format.
///
/// JSON is indented with four spaces and keeps non-ASCII characters
/// verbatim so the file stays readable when edited by hand.
///
/// # Errors
///
/// Returns [`PatternsError::Serialize`] if serialization fails.
pub fn to_string(patterns: &PatternSet, format: PatternFormat) -> Result<String, PatternsError> {
    match format {
        PatternFormat::Json => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            patterns
                .serialize(&mut serializer)
                .map_err(|e| PatternsError::Serialize(e.to_string()))?;
            buf.push(b'\n');
            String::from_utf8(buf).map_err(|e| PatternsError::Serialize(e.to_string()))
        }
        PatternFormat::Toml => {
            toml::to_string_pretty(patterns).map_err(|e| PatternsError::Serialize(e.to_string()))
        }
    }
}

/// Loads the pattern set stored at `path`.
///
/// A missing file loads as an empty set.
///
/// # Errors
///
/// Returns [`PatternsError`] if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<PatternSet, PatternsError> {
    let format = PatternFormat::from_path(path)?;

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!(
                "Pattern file {} does not exist; starting with no patterns",
                path.display()
            );
            return Ok(PatternSet::new());
        }
        Err(e) => return Err(e.into()),
    };

    let patterns = parse_str(&contents, format).map_err(|e| match e {
        PatternsError::Parse { message, .. } => PatternsError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })?;

    log::debug!("Loaded {} pattern(s) from {}", patterns.len(), path.display());

    Ok(patterns)
}

/// Writes `patterns` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`PatternsError`] if serialization or the write fails.
pub fn save(path: &Path, patterns: &PatternSet) -> Result<(), PatternsError> {
    let format = PatternFormat::from_path(path)?;
    let contents = to_string(patterns, format)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, contents)?;

    log::info!("Saved {} pattern(s) to {}", patterns.len(), path.display());

    Ok(())
}

/// Compiles every pattern and returns the fields whose regex is invalid.
///
/// Invalid patterns are allowed in the file; they only fail their own
/// field at extraction time.
#[must_use]
pub fn validate(patterns: &PatternSet) -> Vec<FieldError> {
    CompiledPatterns::compile(patterns)
        .errors()
        .map(FieldError::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PatternSet {
        [
            ("Rechnungsnummer", r"Rechnungsnummer:\s*(\S+)"),
            ("Total", r"Total:\s*(\S+)"),
            ("Kunde", r"Kunde:\s*(\w+) – Straße"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            PatternFormat::from_path(Path::new("patterns.json")).unwrap(),
            PatternFormat::Json
        );
        assert_eq!(
            PatternFormat::from_path(Path::new("conf/patterns.TOML")).unwrap(),
            PatternFormat::Toml
        );
        assert_eq!(
            PatternFormat::from_path(Path::new("patterns")).unwrap(),
            PatternFormat::Json
        );
        assert!(matches!(
            PatternFormat::from_path(Path::new("patterns.yaml")),
            Err(PatternsError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn json_output_is_indented_and_keeps_unicode() {
        let json = to_string(&sample(), PatternFormat::Json).unwrap();

        assert!(json.starts_with("{\n    \"Rechnungsnummer\": "));
        assert!(json.contains("Straße"));
        assert!(!json.contains("\\u"));
        assert_eq!(parse_str(&json, PatternFormat::Json).unwrap(), sample());
    }

    #[test]
    fn toml_keeps_field_order() {
        let toml = "Zeta = 'z+'\nAlpha = '(a)'\n\"Invoice Number\" = 'INV-(\\d+)'\n";
        let set = parse_str(toml, PatternFormat::Toml).unwrap();

        assert_eq!(
            set.field_names().collect::<Vec<_>>(),
            ["Zeta", "Alpha", "Invoice Number"]
        );
        assert_eq!(set.get("Invoice Number"), Some(r"INV-(\d+)"));
    }

    #[test]
    fn parse_rejects_nested_values() {
        let err = parse_str(r#"{"A": {"nested": "x"}}"#, PatternFormat::Json).unwrap_err();
        assert!(matches!(err, PatternsError::Parse { .. }));
    }

    #[test]
    fn save_then_load_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();

        for name in ["nested/patterns.json", "patterns.toml"] {
            let path = dir.path().join(name);
            save(&path, &sample()).unwrap();
            assert_eq!(load(&path).unwrap(), sample());
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = load(&dir.path().join("absent.json")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn validate_lists_only_broken_fields() {
        let mut set = sample();
        set.insert("Broken", "(unclosed");

        let errors = validate(&set);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "Broken");
    }
}
