#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Import, reevaluation, and refresh report types.

use std::path::PathBuf;

use pdf_fields_engine_models::Extraction;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Why a document was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase")]
pub enum SkipReason {
    /// A document with the same identifier is already stored.
    #[strum(to_string = "already imported")]
    AlreadyImported,
    /// An earlier file in the same batch had the same identifier.
    #[strum(to_string = "duplicate in batch")]
    DuplicateInBatch,
}

/// What happened to one file of an import batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    /// Text was extracted and the fields were stored.
    Imported {
        /// Extraction computed at import time.
        extraction: Extraction,
    },
    /// The file was deliberately left out.
    Skipped {
        /// Why it was left out.
        reason: SkipReason,
    },
    /// No text could be obtained for the file.
    TextUnavailable {
        /// Provider error message.
        error: String,
    },
}

/// Outcome of one file in an import batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Path that was imported.
    pub path: PathBuf,
    /// Document identifier, when one could be derived from the path.
    pub document_id: Option<String>,
    /// What happened.
    #[serde(flatten)]
    pub status: ImportStatus,
}

/// Result of importing a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// One entry per input path, in input order.
    pub documents: Vec<DocumentOutcome>,
}

impl ImportReport {
    /// Number of files stored.
    #[must_use]
    pub fn imported(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Imported { .. }))
    }

    /// Number of files left out on purpose.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Skipped { .. }))
    }

    /// Number of files whose text could not be obtained.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::TextUnavailable { .. }))
    }

    fn count(&self, f: impl Fn(&ImportStatus) -> bool) -> usize {
        self.documents.iter().filter(|d| f(&d.status)).count()
    }
}

/// Extraction recomputed for one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reevaluation {
    /// Document identifier.
    pub document_id: String,
    /// Stored document text the extraction ran over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Recomputed extraction.
    pub extraction: Extraction,
}

/// Result of recomputing every stored document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// One entry per stored document, sorted by identifier.
    pub documents: Vec<Reevaluation>,
}

impl RefreshReport {
    /// Number of documents refreshed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents were stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: ImportStatus) -> DocumentOutcome {
        DocumentOutcome {
            path: PathBuf::from("a.pdf"),
            document_id: Some("a".to_owned()),
            status,
        }
    }

    #[test]
    fn report_counts_by_status() {
        let report = ImportReport {
            documents: vec![
                outcome(ImportStatus::Imported {
                    extraction: Extraction::default(),
                }),
                outcome(ImportStatus::Skipped {
                    reason: SkipReason::AlreadyImported,
                }),
                outcome(ImportStatus::Skipped {
                    reason: SkipReason::DuplicateInBatch,
                }),
                outcome(ImportStatus::TextUnavailable {
                    error: "boom".to_owned(),
                }),
            ],
        };

        assert_eq!(report.imported(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn outcome_serializes_with_flat_status_tag() {
        let json = serde_json::to_value(outcome(ImportStatus::Skipped {
            reason: SkipReason::AlreadyImported,
        }))
        .unwrap();

        assert_eq!(json["status"], "SKIPPED");
        assert_eq!(json["reason"], "ALREADY_IMPORTED");
        assert_eq!(json["document_id"], "a");
    }

    #[test]
    fn skip_reason_displays_for_humans() {
        assert_eq!(SkipReason::AlreadyImported.to_string(), "already imported");
        assert_eq!(SkipReason::DuplicateInBatch.as_ref(), "duplicate in batch");
    }
}
