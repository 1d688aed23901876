#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field extraction engine.
//!
//! Applies every pattern of a [`PatternSet`] to a document's text and
//! selects one value per field (see [`selection`] for the policy). The
//! engine is a pure function of its inputs: it performs no I/O and keeps
//! no state between calls, so documents can be processed in any order.
//!
//! A pattern that fails to compile only affects its own field. That field
//! gets no value and is reported in [`Extraction::errors`]; the remaining
//! fields are still extracted.

pub mod selection;

use pdf_fields_engine_models::{
    Extraction, ExtractionResult, FieldError, FieldValue, PatternSet,
};
use regex::Regex;

pub use selection::select_value;

/// Errors raised by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A field's pattern is not a valid regular expression.
    #[error("Invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        /// Field whose pattern failed.
        field: String,
        /// Compiler error.
        #[source]
        source: regex::Error,
    },
}

impl EngineError {
    /// The field this error belongs to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidPattern { field, .. } => field,
        }
    }
}

impl From<&EngineError> for FieldError {
    fn from(e: &EngineError) -> Self {
        match e {
            EngineError::InvalidPattern { field, source } => Self {
                field: field.clone(),
                message: source.to_string(),
            },
        }
    }
}

/// A pattern set compiled once and reusable across many documents.
#[derive(Debug)]
pub struct CompiledPatterns {
    fields: Vec<CompiledField>,
}

#[derive(Debug)]
struct CompiledField {
    name: String,
    regex: Result<Regex, EngineError>,
}

impl CompiledPatterns {
    /// Compiles every pattern in `patterns`.
    ///
    /// Compilation failures are kept per field rather than returned, so a
    /// single bad pattern never prevents the other fields from running.
    #[must_use]
    pub fn compile(patterns: &PatternSet) -> Self {
        let fields = patterns
            .iter()
            .map(|(name, pattern)| {
                let regex = Regex::new(pattern).map_err(|source| {
                    log::debug!("Pattern for field '{name}' does not compile: {source}");
                    EngineError::InvalidPattern {
                        field: name.to_owned(),
                        source,
                    }
                });
                CompiledField {
                    name: name.to_owned(),
                    regex,
                }
            })
            .collect();

        Self { fields }
    }

    /// Number of fields, valid or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compilation errors, in pattern-set order.
    pub fn errors(&self) -> impl Iterator<Item = &EngineError> {
        self.fields.iter().filter_map(|f| f.regex.as_ref().err())
    }

    /// Runs the compiled patterns over `text`.
    #[must_use]
    pub fn extract(&self, text: &str) -> Extraction {
        let mut result = ExtractionResult::new();
        let mut errors = Vec::new();

        for field in &self.fields {
            let value = match &field.regex {
                Ok(regex) => select_value(regex, text),
                Err(e) => {
                    errors.push(FieldError::from(e));
                    None
                }
            };

            log::trace!("Field '{}' -> {value:?}", field.name);
            result.push(FieldValue::new(field.name.clone(), value));
        }

        log::debug!(
            "Extracted {}/{} fields from {} characters of text",
            result.matched_count(),
            result.len(),
            text.chars().count()
        );

        Extraction { result, errors }
    }
}

/// Extracts one value per field of `patterns` from `text`.
///
/// Convenience wrapper around [`CompiledPatterns`] for a single document.
/// Prefer compiling once when the same pattern set runs over a batch.
#[must_use]
pub fn extract_fields(text: &str, patterns: &PatternSet) -> Extraction {
    CompiledPatterns::compile(patterns).extract(text)
}
