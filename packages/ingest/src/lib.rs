#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Import, reevaluation, and refresh workflows.
//!
//! These tie the text provider, the extraction engine, and storage
//! together:
//!
//! - [`import_files`] reads new documents, extracts their fields, and
//!   stores both. Documents already in the database are never re-imported.
//! - [`reevaluate`] previews what the current patterns would extract from
//!   a stored document without writing anything.
//! - [`refresh_all`] recomputes every stored document with the current
//!   patterns and replaces its stored fields.
//!
//! Per-document problems (unreadable files, invalid patterns) are
//! reported in the returned reports. Only storage failures abort a batch.

pub mod progress;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use duckdb::Connection;
use pdf_fields_database::{DbError, documents};
use pdf_fields_engine::{CompiledPatterns, extract_fields};
use pdf_fields_engine_models::PatternSet;
use pdf_fields_ingest_models::{
    DocumentOutcome, ImportReport, ImportStatus, Reevaluation, RefreshReport, SkipReason,
};
use pdf_fields_pdf::{TextProvider, document_id};

use crate::progress::ProgressCallback;

/// Errors that abort a whole workflow.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Storage failed.
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Compiles `patterns` and logs each invalid one once for the batch.
fn compile(patterns: &PatternSet) -> CompiledPatterns {
    let compiled = CompiledPatterns::compile(patterns);
    for e in compiled.errors() {
        log::error!("{e}; field '{}' will have no value", e.field());
    }
    compiled
}

/// Imports documents from `paths`.
///
/// Each path becomes one entry of the returned report, in input order:
/// - already stored, or already imported from an earlier path: skipped;
/// - `provider` cannot produce text: reported as text-unavailable;
/// - otherwise fields are extracted and the text and fields are stored.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if storage fails. Documents stored before
/// the failure stay stored.
pub fn import_files(
    conn: &Connection,
    provider: &dyn TextProvider,
    patterns: &PatternSet,
    paths: &[PathBuf],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportReport, IngestError> {
    let start = Instant::now();
    let compiled = compile(patterns);
    let mut seen = BTreeSet::new();
    let mut report = ImportReport::default();

    progress.set_total(paths.len() as u64);

    log::info!(
        "Importing {} file(s) with {} pattern(s) using the {} text provider",
        paths.len(),
        compiled.len(),
        provider.name()
    );

    for path in paths {
        progress.set_message(path.display().to_string());

        let id = match document_id(path) {
            Ok(id) => id,
            Err(e) => {
                log::error!("Cannot import {}: {e}", path.display());
                report.documents.push(DocumentOutcome {
                    path: path.clone(),
                    document_id: None,
                    status: ImportStatus::TextUnavailable {
                        error: e.to_string(),
                    },
                });
                progress.inc(1);
                continue;
            }
        };

        let status = if seen.contains(&id) {
            log::warn!("File '{id}' was already imported from an earlier file in this batch");
            ImportStatus::Skipped {
                reason: SkipReason::DuplicateInBatch,
            }
        } else if documents::document_exists(conn, &id)? {
            log::warn!("File '{id}' is already in the database and won't be re-imported");
            ImportStatus::Skipped {
                reason: SkipReason::AlreadyImported,
            }
        } else {
            match provider.extract_text(path) {
                Ok(text) => {
                    let extraction = compiled.extract(&text);
                    documents::save_document(conn, &id, &text, &extraction.result)?;
                    seen.insert(id.clone());
                    log::info!(
                        "Imported '{id}': {}/{} field(s) matched",
                        extraction.result.matched_count(),
                        extraction.result.len()
                    );
                    ImportStatus::Imported { extraction }
                }
                Err(e) => {
                    log::error!("No text available for '{id}' ({}): {e}", path.display());
                    ImportStatus::TextUnavailable {
                        error: e.to_string(),
                    }
                }
            }
        };

        report.documents.push(DocumentOutcome {
            path: path.clone(),
            document_id: Some(id),
            status,
        });
        progress.inc(1);
    }

    progress.finish(format!(
        "Imported {} of {} file(s) in {:.1}s",
        report.imported(),
        paths.len(),
        start.elapsed().as_secs_f64()
    ));

    Ok(report)
}

/// Recomputes a stored document's extraction with `patterns` without
/// storing it. Returns `None` when no text is stored for `id`.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if the stored text cannot be read.
pub fn reevaluate(
    conn: &Connection,
    patterns: &PatternSet,
    id: &str,
) -> Result<Option<Reevaluation>, IngestError> {
    let Some(text) = documents::get_raw_text(conn, id)? else {
        log::warn!("No raw text found for '{id}'");
        return Ok(None);
    };

    let extraction = extract_fields(&text, patterns);

    Ok(Some(Reevaluation {
        document_id: id.to_owned(),
        text: Some(text),
        extraction,
    }))
}

/// Recomputes one stored document and replaces its stored fields.
/// Returns `None` when no text is stored for `id`.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if reading or writing fails.
pub fn refresh_document(
    conn: &Connection,
    patterns: &PatternSet,
    id: &str,
) -> Result<Option<Reevaluation>, IngestError> {
    let Some(reevaluation) = reevaluate(conn, patterns, id)? else {
        return Ok(None);
    };

    documents::replace_fields(conn, id, &reevaluation.extraction.result)?;
    log::info!("Refreshed '{id}'");

    Ok(Some(reevaluation))
}

/// Recomputes every stored document with `patterns` and replaces its
/// stored fields. Fields that are no longer in `patterns` are removed.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if reading or writing fails. Documents
/// refreshed before the failure keep their new fields.
pub fn refresh_all(
    conn: &Connection,
    patterns: &PatternSet,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RefreshReport, IngestError> {
    let start = Instant::now();
    let compiled = compile(patterns);
    let texts = documents::load_all_raw_text(conn)?;
    let mut report = RefreshReport::default();

    progress.set_total(texts.len() as u64);

    for (id, text) in texts {
        progress.set_message(id.clone());

        let extraction = compiled.extract(&text);
        documents::replace_fields(conn, &id, &extraction.result)?;

        report.documents.push(Reevaluation {
            document_id: id,
            text: None,
            extraction,
        });
        progress.inc(1);
    }

    let msg = format!(
        "Refreshed {} document(s) in {:.1}s",
        report.len(),
        start.elapsed().as_secs_f64()
    );
    log::info!("{msg}");
    progress.finish(msg);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use pdf_fields_pdf::TextError;

    use super::*;
    use crate::progress::null_progress;

    /// Serves fixed texts by path; unknown paths fail like an unreadable PDF.
    struct FixtureProvider(BTreeMap<PathBuf, String>);

    impl FixtureProvider {
        fn new(docs: &[(&str, &str)]) -> Self {
            Self(
                docs.iter()
                    .map(|(p, t)| (PathBuf::from(p), (*t).to_owned()))
                    .collect(),
            )
        }
    }

    impl TextProvider for FixtureProvider {
        fn extract_text(&self, path: &Path) -> Result<String, TextError> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| TextError::Extraction(format!("unreadable: {}", path.display())))
        }

        fn name(&self) -> &'static str {
            "fixture"
        }
    }

    fn patterns(entries: &[(&str, &str)]) -> PatternSet {
        entries.iter().copied().collect()
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn import_stores_text_and_fields() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[("in/a.pdf", "Total: 42 Total: 4200")]);
        let set = patterns(&[("Total", r"Total:\s*(\S+)"), ("Date", r"Date: (\S+)")]);

        let report =
            import_files(&conn, &provider, &set, &paths(&["in/a.pdf"]), &null_progress()).unwrap();

        assert_eq!(report.imported(), 1);
        assert_eq!(report.documents[0].document_id.as_deref(), Some("a"));

        let stored = documents::get_fields(&conn, "a").unwrap();
        assert_eq!(stored.value("Total"), Some("42"));
        assert_eq!(stored.get("Date"), Some(None));
        assert_eq!(
            documents::get_raw_text(&conn, "a").unwrap().as_deref(),
            Some("Total: 42 Total: 4200")
        );
    }

    #[test]
    fn import_skips_known_and_repeated_documents() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[
            ("a.pdf", "Name: Alice"),
            ("other/a.pdf", "Name: Mallory"),
            ("b.pdf", "Name: Bob"),
        ]);
        let set = patterns(&[("Name", r"Name:\s*(\w+)")]);
        let progress = null_progress();

        import_files(&conn, &provider, &set, &paths(&["a.pdf"]), &progress).unwrap();
        let report = import_files(
            &conn,
            &provider,
            &set,
            &paths(&["other/a.pdf", "b.pdf", "b.pdf"]),
            &progress,
        )
        .unwrap();

        let statuses: Vec<_> = report.documents.iter().map(|d| &d.status).collect();
        assert_eq!(
            statuses[0],
            &ImportStatus::Skipped {
                reason: SkipReason::AlreadyImported
            }
        );
        assert!(matches!(statuses[1], ImportStatus::Imported { .. }));
        assert_eq!(
            statuses[2],
            &ImportStatus::Skipped {
                reason: SkipReason::DuplicateInBatch
            }
        );
        assert_eq!(documents::get_fields(&conn, "a").unwrap().value("Name"), Some("Alice"));
    }

    #[test]
    fn unreadable_first_copy_does_not_block_a_later_one() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[("y/a.pdf", "Name: Alice")]);
        let set = patterns(&[("Name", r"Name:\s*(\w+)")]);

        let report = import_files(
            &conn,
            &provider,
            &set,
            &paths(&["x/a.pdf", "y/a.pdf", "z/a.pdf"]),
            &null_progress(),
        )
        .unwrap();

        assert!(matches!(
            report.documents[0].status,
            ImportStatus::TextUnavailable { .. }
        ));
        assert!(matches!(
            report.documents[1].status,
            ImportStatus::Imported { .. }
        ));
        assert_eq!(
            report.documents[2].status,
            ImportStatus::Skipped {
                reason: SkipReason::DuplicateInBatch
            }
        );
        assert_eq!(documents::get_fields(&conn, "a").unwrap().value("Name"), Some("Alice"));
    }

    #[test]
    fn unreadable_document_does_not_stop_the_batch() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[("good.pdf", "Name: Alice")]);
        let set = patterns(&[("Name", r"Name:\s*(\w+)")]);

        let report = import_files(
            &conn,
            &provider,
            &set,
            &paths(&["bad.pdf", "good.pdf"]),
            &null_progress(),
        )
        .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.imported(), 1);
        assert!(!documents::document_exists(&conn, "bad").unwrap());
        assert!(documents::document_exists(&conn, "good").unwrap());
    }

    #[test]
    fn import_reports_invalid_patterns_per_field() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[("a.pdf", "Name: Alice")]);
        let set = patterns(&[("Broken", "(x"), ("Name", r"Name:\s*(\w+)")]);

        let report =
            import_files(&conn, &provider, &set, &paths(&["a.pdf"]), &null_progress()).unwrap();

        let ImportStatus::Imported { extraction } = &report.documents[0].status else {
            panic!("expected import");
        };
        assert_eq!(extraction.errors.len(), 1);
        assert_eq!(extraction.errors[0].field, "Broken");
        assert_eq!(extraction.result.value("Name"), Some("Alice"));
    }

    #[test]
    fn reevaluate_previews_without_writing() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[("a.pdf", "Name: Alice\nTotal: 42")]);
        let old = patterns(&[("Name", r"Name:\s*(\w+)")]);
        import_files(&conn, &provider, &old, &paths(&["a.pdf"]), &null_progress()).unwrap();

        let new = patterns(&[("Total", r"Total:\s*(\d+)")]);
        let preview = reevaluate(&conn, &new, "a").unwrap().unwrap();

        assert_eq!(preview.extraction.result.value("Total"), Some("42"));
        assert_eq!(preview.text.as_deref(), Some("Name: Alice\nTotal: 42"));
        assert_eq!(documents::get_fields(&conn, "a").unwrap().value("Name"), Some("Alice"));
        assert!(reevaluate(&conn, &new, "missing").unwrap().is_none());
    }

    #[test]
    fn refresh_replaces_fields_of_every_document() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[
            ("a.pdf", "Name: Alice\nTotal: 42"),
            ("b.pdf", "Name: Bob\nTotal: 7"),
        ]);
        let old = patterns(&[("Name", r"Name:\s*(\w+)"), ("Total", r"Total:\s*(\d+)")]);
        import_files(&conn, &provider, &old, &paths(&["a.pdf", "b.pdf"]), &null_progress())
            .unwrap();

        let new = patterns(&[("Total", r"Total:\s*(\d+)"), ("Initial", r"Name: (\w)")]);
        let report = refresh_all(&conn, &new, &null_progress()).unwrap();

        assert_eq!(report.len(), 2);
        for id in ["a", "b"] {
            let stored = documents::get_fields(&conn, id).unwrap();
            assert_eq!(stored.field_names().collect::<Vec<_>>(), ["Total", "Initial"]);
            assert_eq!(stored.get("Name"), None);
        }
        assert_eq!(documents::get_fields(&conn, "b").unwrap().value("Initial"), Some("B"));

        let again = refresh_all(&conn, &new, &null_progress()).unwrap();
        assert_eq!(again, report);
    }

    #[test]
    fn refresh_document_persists_single_document() {
        let conn = documents::open_in_memory().unwrap();
        let provider = FixtureProvider::new(&[("a.pdf", "Total: 42"), ("b.pdf", "Total: 7")]);
        let old = patterns(&[("Total", r"Total:\s*(\d+)")]);
        import_files(&conn, &provider, &old, &paths(&["a.pdf", "b.pdf"]), &null_progress())
            .unwrap();

        let new = patterns(&[("Amount", r"Total:\s*(\d+)")]);
        refresh_document(&conn, &new, "a").unwrap().unwrap();

        assert_eq!(documents::get_fields(&conn, "a").unwrap().value("Amount"), Some("42"));
        assert_eq!(documents::get_fields(&conn, "b").unwrap().value("Total"), Some("7"));
        assert!(refresh_document(&conn, &new, "zzz").unwrap().is_none());
    }
}
