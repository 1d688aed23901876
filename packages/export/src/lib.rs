#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular view of extracted fields.
//!
//! Pivots stored `(document, field, value)` rows into a [`ResultTable`]
//! with one row per document and one column per field, then renders it as
//! CSV or as an aligned plain-text table for the terminal.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use pdf_fields_database::StoredField;

/// Header of the document identifier column.
pub const FILE_NAME_COLUMN: &str = "File Name";

/// Errors from writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Documents as rows, fields as columns.
///
/// Rows are sorted by document identifier and field columns by name. A
/// cell is empty when the document has no value for that field or the
/// field was not part of the patterns it was extracted with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    fields: Vec<String>,
    rows: Vec<(String, Vec<Option<String>>)>,
}

impl ResultTable {
    /// Builds the pivot table from stored field rows.
    #[must_use]
    pub fn from_fields(stored: &[StoredField]) -> Self {
        let fields: Vec<String> = stored
            .iter()
            .map(|f| f.key.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect();

        let mut by_document: BTreeMap<&str, Vec<Option<String>>> = BTreeMap::new();

        for row in stored {
            let cells = by_document
                .entry(row.file_name.as_str())
                .or_insert_with(|| vec![None; fields.len()]);

            if let Ok(col) = fields.binary_search(&row.key) {
                cells[col].clone_from(&row.value);
            }
        }

        let rows = by_document
            .into_iter()
            .map(|(id, cells)| (id.to_owned(), cells))
            .collect();

        Self { fields, rows }
    }

    /// Whether the table has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of document rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Field column names, without the leading file name column.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Full header row, starting with [`FILE_NAME_COLUMN`].
    #[must_use]
    pub fn header(&self) -> Vec<&str> {
        std::iter::once(FILE_NAME_COLUMN)
            .chain(self.fields.iter().map(String::as_str))
            .collect()
    }

    /// Returns one cell, `None` when it is empty or out of range.
    #[must_use]
    pub fn cell(&self, document: &str, field: &str) -> Option<&str> {
        let col = self.fields.iter().position(|f| f == field)?;
        self.rows
            .iter()
            .find(|(id, _)| id == document)
            .and_then(|(_, cells)| cells[col].as_deref())
    }

    fn records(&self) -> impl Iterator<Item = Vec<&str>> {
        self.rows.iter().map(|(id, cells)| {
            std::iter::once(id.as_str())
                .chain(cells.iter().map(|c| c.as_deref().unwrap_or("")))
                .collect()
        })
    }

    /// Writes the table as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if serialization or the write fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);

        csv.write_record(self.header())?;
        for record in self.records() {
            csv.write_record(record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Writes the table as CSV to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the file cannot be created or written.
    pub fn write_csv_file(&self, path: &Path) -> Result<(), ExportError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))?;

        log::info!(
            "Exported {} document(s) x {} field(s) to {}",
            self.rows.len(),
            self.fields.len(),
            path.display()
        );

        Ok(())
    }

    /// Renders the table as aligned plain text for the terminal.
    #[must_use]
    pub fn render(&self) -> String {
        let header = self.header();
        let records: Vec<Vec<&str>> = self.records().collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for record in &records {
            for (width, cell) in widths.iter_mut().zip(record) {
                *width = (*width).max(display_cell(cell).chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(
            &mut out,
            &rule.iter().map(String::as_str).collect::<Vec<_>>(),
            &widths,
        );
        for record in &records {
            push_line(&mut out, record, &widths);
        }

        out
    }
}

/// Collapses line breaks so multi-line values stay on one table row.
fn display_cell(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", display_cell(cell), width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str, key: &str, value: Option<&str>) -> StoredField {
        StoredField {
            file_name: file.to_owned(),
            key: key.to_owned(),
            value: value.map(str::to_owned),
        }
    }

    fn sample() -> ResultTable {
        ResultTable::from_fields(&[
            row("invoice_b", "Total", Some("4200")),
            row("invoice_a", "Total", Some("42")),
            row("invoice_a", "Customer", Some("Alice, Inc.")),
            row("invoice_b", "Customer", None),
            row("invoice_b", "Date", Some("2024-03-01")),
        ])
    }

    #[test]
    fn pivots_documents_into_rows() {
        let table = sample();

        assert_eq!(table.len(), 2);
        assert_eq!(table.header(), ["File Name", "Customer", "Date", "Total"]);
        assert_eq!(table.fields(), ["Customer", "Date", "Total"]);
        assert_eq!(table.cell("invoice_a", "Total"), Some("42"));
        assert_eq!(table.cell("invoice_a", "Date"), None);
        assert_eq!(table.cell("invoice_b", "Customer"), None);
        assert_eq!(table.cell("invoice_b", "Date"), Some("2024-03-01"));
    }

    #[test]
    fn csv_quotes_and_leaves_missing_cells_empty() {
        let mut buf = Vec::new();
        sample().write_csv(&mut buf).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "File Name,Customer,Date,Total\n\
             invoice_a,\"Alice, Inc.\",,42\n\
             invoice_b,,2024-03-01,4200\n"
        );
    }

    #[test]
    fn csv_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_data.csv");

        sample().write_csv_file(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("File Name,Customer,Date,Total\n"));
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn empty_table_has_only_header() {
        let table = ResultTable::from_fields(&[]);
        assert!(table.is_empty());

        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "File Name\n");
    }

    #[test]
    fn render_aligns_columns_and_flattens_newlines() {
        let table = ResultTable::from_fields(&[
            row("a", "Address", Some("1 Main St\nSpringfield")),
            row("long_name", "Address", None),
        ]);

        let rendered = table.render();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], "File Name  Address");
        assert_eq!(lines[1], "---------  ---------------------");
        assert_eq!(lines[2], "a          1 Main St Springfield");
        assert_eq!(lines[3], "long_name");
    }
}
