//! Command implementations shared by the subcommands and the interactive
//! menu.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use duckdb::Connection;
use pdf_fields_cli_utils::{IndicatifProgress, MultiProgress};
use pdf_fields_database::{DbError, documents};
use pdf_fields_engine_models::{ExtractionResult, FieldError, PatternSet};
use pdf_fields_export::ResultTable;
use pdf_fields_ingest::{import_files, reevaluate, refresh_all};
use pdf_fields_ingest_models::{ImportReport, ImportStatus};
use pdf_fields_patterns::PatternsError;
use pdf_fields_pdf::AutoTextProvider;
use serde::Serialize;

/// File extensions picked up when a directory is given to `import`.
const IMPORTABLE_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Where the commands read and write, and how they report.
pub struct Context {
    pub db_path: PathBuf,
    pub patterns_path: PathBuf,
    /// Print reports as JSON instead of text.
    pub json: bool,
    pub multi: MultiProgress,
}

impl Context {
    fn open_db(&self) -> Result<Connection, DbError> {
        documents::open(&self.db_path)
    }

    pub fn load_patterns(&self) -> Result<PatternSet, PatternsError> {
        pdf_fields_patterns::load(&self.patterns_path)
    }

    fn save_patterns(&self, patterns: &PatternSet) -> Result<(), PatternsError> {
        pdf_fields_patterns::save(&self.patterns_path, patterns)
    }

    /// Identifiers of every stored document.
    pub fn document_ids(&self) -> Result<Vec<String>, DbError> {
        let conn = self.open_db()?;
        Ok(documents::list_documents(&conn)?
            .into_iter()
            .map(|d| d.id)
            .collect())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a warning for every pattern that does not compile and returns
/// them. Those fields get no value until the pattern is fixed.
fn warn_invalid_patterns(patterns: &PatternSet) -> Vec<FieldError> {
    let errors = pdf_fields_patterns::validate(patterns);
    for e in &errors {
        eprintln!("warning: {e}");
    }
    errors
}

/// Expands directories into the importable files they directly contain,
/// sorted by name. Other paths are kept as given.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be read.
pub fn collect_inputs(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file = entry?.path();
            let importable = file.is_file()
                && file
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| {
                        IMPORTABLE_EXTENSIONS
                            .iter()
                            .any(|known| e.eq_ignore_ascii_case(known))
                    });
            if importable {
                found.push(file);
            }
        }
        found.sort();

        log::debug!("Found {} importable file(s) in {}", found.len(), path.display());
        inputs.extend(found);
    }

    Ok(inputs)
}

/// Imports files (or directories of files) and prints what happened.
///
/// # Errors
///
/// Returns an error if the pattern file or database cannot be used.
pub fn import(ctx: &Context, paths: &[PathBuf]) -> Result<ImportReport, Box<dyn Error>> {
    let inputs = collect_inputs(paths)?;
    if inputs.is_empty() {
        println!("No files to import.");
        return Ok(ImportReport::default());
    }

    let patterns = ctx.load_patterns()?;
    warn_invalid_patterns(&patterns);
    let conn = ctx.open_db()?;
    let progress = IndicatifProgress::documents_bar(&ctx.multi, "Importing files...");

    let report = import_files(&conn, &AutoTextProvider::new(), &patterns, &inputs, &progress)?;

    if ctx.json {
        print_json(&report)?;
        return Ok(report);
    }

    let mut extracted: BTreeMap<&str, &ExtractionResult> = BTreeMap::new();

    for outcome in &report.documents {
        let path = outcome.path.display();
        match &outcome.status {
            ImportStatus::Imported { extraction } => {
                let id = outcome.document_id.as_deref().unwrap_or_default();
                println!(
                    "{path}: imported as '{id}' ({}/{} fields matched)",
                    extraction.result.matched_count(),
                    extraction.result.len()
                );
                extracted.insert(id, &extraction.result);
            }
            ImportStatus::Skipped { reason } => println!("{path}: skipped ({reason})"),
            ImportStatus::TextUnavailable { error } => println!("{path}: failed ({error})"),
        }
    }

    println!(
        "\nImported {}, skipped {}, failed {}",
        report.imported(),
        report.skipped(),
        report.failed()
    );

    if !extracted.is_empty() {
        println!("\nExtracted information:");
        print_json(&extracted)?;
    }

    Ok(report)
}

fn load_table(ctx: &Context) -> Result<ResultTable, DbError> {
    let conn = ctx.open_db()?;
    Ok(ResultTable::from_fields(&documents::get_all_fields(&conn)?))
}

/// Prints every stored document's fields as one table.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub fn view(ctx: &Context) -> Result<(), Box<dyn Error>> {
    if ctx.json {
        let conn = ctx.open_db()?;
        print_json(&documents::get_all_fields(&conn)?)?;
        return Ok(());
    }

    let table = load_table(ctx)?;
    if table.is_empty() {
        println!("No data available.");
    } else {
        print!("{}", table.render());
    }

    Ok(())
}

/// Writes the result table as CSV to `output`, or to stdout for `-`.
///
/// # Errors
///
/// Returns an error if the database cannot be read or the CSV cannot be
/// written.
pub fn export(ctx: &Context, output: &str) -> Result<(), Box<dyn Error>> {
    let table = load_table(ctx)?;

    if output == "-" {
        table.write_csv(std::io::stdout().lock())?;
        return Ok(());
    }

    if table.is_empty() {
        println!("No data available.");
        return Ok(());
    }

    table.write_csv_file(Path::new(output))?;
    println!(
        "Exported {} document(s) with {} field(s) to {output}",
        table.len(),
        table.fields().len()
    );

    Ok(())
}

/// Lists stored documents.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub fn list_documents(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let conn = ctx.open_db()?;
    let docs = documents::list_documents(&conn)?;

    if ctx.json {
        print_json(&docs)?;
        return Ok(());
    }

    if docs.is_empty() {
        println!("No documents imported yet.");
        return Ok(());
    }

    let width = docs.iter().map(|d| d.id.chars().count()).max().unwrap_or(0).max(8);
    println!("{:<width$}  {:<19}  FIELDS", "DOCUMENT", "IMPORTED");
    println!("{}", "-".repeat(width + 31));
    for doc in &docs {
        let imported = doc
            .imported_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:<width$}  {imported:<19}  {}/{}",
            doc.id, doc.matched_count, doc.field_count
        );
    }

    Ok(())
}

/// Shows what the current patterns extract from a stored document
/// without storing anything.
///
/// # Errors
///
/// Returns an error if the document is unknown or the stored data cannot
/// be read.
pub fn reevaluate_document(ctx: &Context, id: &str, show_text: bool) -> Result<(), Box<dyn Error>> {
    let patterns = ctx.load_patterns()?;
    warn_invalid_patterns(&patterns);
    let conn = ctx.open_db()?;

    let Some(mut preview) = reevaluate(&conn, &patterns, id)? else {
        return Err(format!("No raw text found for '{id}'").into());
    };

    if !show_text {
        preview.text = None;
    }

    if ctx.json {
        print_json(&preview)?;
        return Ok(());
    }

    if let Some(text) = &preview.text {
        println!("--- Raw text of '{id}' ---");
        println!("{text}");
        println!("---");
    }

    println!("Reevaluated information:");
    print_json(&preview.extraction.result)?;

    Ok(())
}

/// Recomputes and stores the fields of every document.
///
/// # Errors
///
/// Returns an error if the pattern file or database cannot be used.
pub fn refresh(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let patterns = ctx.load_patterns()?;
    warn_invalid_patterns(&patterns);
    let conn = ctx.open_db()?;
    let progress = IndicatifProgress::documents_bar(&ctx.multi, "Refreshing documents...");

    let report = refresh_all(&conn, &patterns, &progress)?;

    if ctx.json {
        print_json(&report)?;
        return Ok(());
    }

    println!("Refreshed {} document(s)", report.len());

    let updated: BTreeMap<&str, &ExtractionResult> = report
        .documents
        .iter()
        .map(|d| (d.document_id.as_str(), &d.extraction.result))
        .collect();
    if !updated.is_empty() {
        print_json(&updated)?;
    }

    Ok(())
}

/// Removes a document's text and fields.
///
/// # Errors
///
/// Returns an error if the document is unknown or the delete fails.
pub fn delete(ctx: &Context, id: &str) -> Result<(), Box<dyn Error>> {
    let conn = ctx.open_db()?;
    if !documents::delete_document(&conn, id)? {
        return Err(format!("No document named '{id}'").into());
    }
    println!("Deleted '{id}'");
    Ok(())
}

/// Prints the configured patterns in file order.
///
/// # Errors
///
/// Returns an error if the pattern file cannot be read.
pub fn list_patterns(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let patterns = ctx.load_patterns()?;

    if ctx.json {
        print_json(&patterns)?;
        return Ok(());
    }

    if patterns.is_empty() {
        println!("No patterns configured in {}", ctx.patterns_path.display());
        return Ok(());
    }

    let width = patterns.field_names().map(|f| f.chars().count()).max().unwrap_or(0);
    for (field, pattern) in patterns.iter() {
        println!("{field:<width$}  {pattern}");
    }

    Ok(())
}

/// Adds a pattern or replaces an existing field's pattern. The field keeps
/// its position when replaced.
///
/// # Errors
///
/// Returns an error if the regex is invalid or the pattern file cannot be
/// read or written.
pub fn set_pattern(ctx: &Context, field: &str, regex: &str) -> Result<(), Box<dyn Error>> {
    let single: PatternSet = [(field, regex)].into_iter().collect();
    if let Some(e) = pdf_fields_patterns::validate(&single).into_iter().next() {
        return Err(e.to_string().into());
    }

    let mut patterns = ctx.load_patterns()?;
    let previous = patterns.insert(field, regex);
    ctx.save_patterns(&patterns)?;

    match previous {
        Some(_) => println!("Updated pattern for '{field}'"),
        None => println!("Added pattern for '{field}'"),
    }

    Ok(())
}

/// Removes a field's pattern.
///
/// # Errors
///
/// Returns an error if the field is unknown or the pattern file cannot be
/// read or written.
pub fn remove_pattern(ctx: &Context, field: &str) -> Result<(), Box<dyn Error>> {
    let mut patterns = ctx.load_patterns()?;
    if patterns.remove(field).is_none() {
        return Err(format!("No pattern for field '{field}'").into());
    }
    ctx.save_patterns(&patterns)?;
    println!("Removed pattern for '{field}'");
    Ok(())
}

/// Renames a field, keeping its pattern and position.
///
/// # Errors
///
/// Returns an error if `from` is unknown, `to` is taken, or the pattern
/// file cannot be read or written.
pub fn rename_pattern(ctx: &Context, from: &str, to: &str) -> Result<(), Box<dyn Error>> {
    let mut patterns = ctx.load_patterns()?;
    if !patterns.contains(from) {
        return Err(format!("No pattern for field '{from}'").into());
    }
    if !patterns.rename(from, to) {
        return Err(format!("Field '{to}' already exists").into());
    }
    ctx.save_patterns(&patterns)?;
    println!("Renamed '{from}' to '{to}'");
    Ok(())
}

/// Compiles every pattern and reports the invalid ones.
///
/// # Errors
///
/// Returns an error if the pattern file cannot be read or any pattern is
/// invalid.
pub fn check_patterns(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let patterns = ctx.load_patterns()?;
    let errors = pdf_fields_patterns::validate(&patterns);

    if ctx.json {
        print_json(&errors)?;
    } else if errors.is_empty() {
        println!("All {} pattern(s) compile", patterns.len());
    } else {
        for e in &errors {
            println!("{e}");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} invalid pattern(s)", errors.len()).into())
    }
}
