#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for document text and extracted fields.
//!
//! One database file holds every imported document: its raw text (one
//! row per document, keyed by document identifier) and its extracted
//! fields (one row per document and field). Re-extraction replaces a
//! document's fields wholesale; see [`documents::replace_fields`].

pub mod documents;
pub mod paths;

pub use documents::{DocumentSummary, StoredField};

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` query error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
