//! Document text and extracted field storage.
//!
//! Tables:
//! - `raw_text`: one row per document with the full extracted text.
//! - `extracted_data`: one row per `(file_name, key)`; `value` is `NULL`
//!   when the field had no value. `position` keeps the pattern-set order.
//!
//! `(file_name, key)` uniqueness is upheld by the write path: a document's
//! rows are only ever written by deleting all of them and inserting the
//! new result inside one transaction.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use pdf_fields_engine_models::{ExtractionResult, FieldValue};
use serde::Serialize;

use crate::DbError;

/// A stored document with summary information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    /// Document identifier (file name without extension).
    pub id: String,
    /// When the document was first imported, or last re-imported.
    pub imported_at: Option<DateTime<Utc>>,
    /// Number of stored fields.
    pub field_count: u64,
    /// Number of stored fields that have a value.
    pub matched_count: u64,
}

/// One stored `(document, field, value)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredField {
    /// Document identifier.
    pub file_name: String,
    /// Field name.
    pub key: String,
    /// Extracted value, `None` for the no-value marker.
    pub value: Option<String>,
}

/// Opens (or creates) the database at `path` and ensures the schema
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;

    log::debug!("Opened document database at {}", path.display());

    Ok(conn)
}

/// Opens a throwaway in-memory database with the schema in place.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS raw_text (
            file_name TEXT NOT NULL PRIMARY KEY,
            text TEXT NOT NULL,
            imported_at TIMESTAMP NOT NULL
        );

        CREATE TABLE IF NOT EXISTS extracted_data (
            file_name TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT,
            position INTEGER NOT NULL
        );",
    )?;

    Ok(())
}

/// Runs `f` inside a transaction, rolling back if it fails.
fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, DbError>,
) -> Result<T, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                log::warn!("Rollback failed: {rollback}");
            }
            Err(e)
        }
    }
}

/// Returns whether a document with this identifier is already stored.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn document_exists(conn: &Connection, id: &str) -> Result<bool, DbError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM raw_text WHERE file_name = ?")?;
    let count: i64 = stmt.query_row([id], |row| row.get(0))?;
    Ok(count > 0)
}

/// Stores a document's text and its extraction result in one
/// transaction. An existing document with the same identifier is
/// overwritten.
///
/// # Errors
///
/// Returns [`DbError`] if any write fails; nothing is stored in that case.
pub fn save_document(
    conn: &Connection,
    id: &str,
    text: &str,
    result: &ExtractionResult,
) -> Result<(), DbError> {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    in_transaction(conn, |conn| {
        conn.execute(
            "INSERT INTO raw_text (file_name, text, imported_at) VALUES (?, ?, ?)
             ON CONFLICT (file_name) DO UPDATE SET
                text = EXCLUDED.text,
                imported_at = EXCLUDED.imported_at",
            duckdb::params![id, text, now],
        )?;
        write_fields(conn, id, result)
    })?;

    log::debug!("Stored document '{id}' with {} field(s)", result.len());

    Ok(())
}

/// Replaces every stored field of a document with `result`.
///
/// Fields not present in `result` are removed; nothing is merged.
///
/// # Errors
///
/// Returns [`DbError`] if any write fails; the previous fields are kept in
/// that case.
pub fn replace_fields(
    conn: &Connection,
    id: &str,
    result: &ExtractionResult,
) -> Result<(), DbError> {
    in_transaction(conn, |conn| write_fields(conn, id, result))
}

fn write_fields(conn: &Connection, id: &str, result: &ExtractionResult) -> Result<(), DbError> {
    conn.execute("DELETE FROM extracted_data WHERE file_name = ?", [id])?;

    let mut stmt = conn.prepare(
        "INSERT INTO extracted_data (file_name, key, value, position) VALUES (?, ?, ?, ?)",
    )?;

    for (position, field) in result.iter().enumerate() {
        let position = i32::try_from(position).unwrap_or(i32::MAX);
        stmt.execute(duckdb::params![
            id,
            &field.field,
            field.value.as_deref(),
            position
        ])?;
    }

    Ok(())
}

/// Returns the stored text of a document, or `None` if it is unknown.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_raw_text(conn: &Connection, id: &str) -> Result<Option<String>, DbError> {
    let mut stmt = conn.prepare("SELECT text FROM raw_text WHERE file_name = ?")?;
    let result = stmt.query_row([id], |row| row.get(0));
    match result {
        Ok(text) => Ok(Some(text)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::DuckDb(e)),
    }
}

/// Returns every stored `(id, text)` pair, sorted by identifier.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn load_all_raw_text(conn: &Connection) -> Result<Vec<(String, String)>, DbError> {
    let mut stmt = conn.prepare("SELECT file_name, text FROM raw_text ORDER BY file_name")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns the stored extraction result of a document in its original
/// field order. Unknown documents yield an empty result.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_fields(conn: &Connection, id: &str) -> Result<ExtractionResult, DbError> {
    let mut stmt = conn.prepare(
        "SELECT key, value FROM extracted_data WHERE file_name = ? ORDER BY position, key",
    )?;
    let fields = stmt
        .query_map([id], |row| Ok(FieldValue::new(row.get::<_, String>(0)?, row.get(1)?)))?
        .collect::<Result<ExtractionResult, _>>()?;
    Ok(fields)
}

/// Returns every stored field row, sorted by document then field name.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_all_fields(conn: &Connection) -> Result<Vec<StoredField>, DbError> {
    let mut stmt =
        conn.prepare("SELECT file_name, key, value FROM extracted_data ORDER BY file_name, key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredField {
                file_name: row.get(0)?,
                key: row.get(1)?,
                value: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists stored documents with field counts, sorted by identifier.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn list_documents(conn: &Connection) -> Result<Vec<DocumentSummary>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT r.file_name, r.imported_at::TEXT, COUNT(e.key), COUNT(e.value)
         FROM raw_text r
         LEFT JOIN extracted_data e ON e.file_name = r.file_name
         GROUP BY r.file_name, r.imported_at
         ORDER BY r.file_name",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let imported_at: Option<String> = row.get(1)?;
            let field_count: i64 = row.get(2)?;
            let matched_count: i64 = row.get(3)?;
            Ok(DocumentSummary {
                id: row.get(0)?,
                imported_at: imported_at.as_deref().and_then(parse_timestamp),
                field_count: u64::try_from(field_count).unwrap_or(0),
                matched_count: u64::try_from(matched_count).unwrap_or(0),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Removes a document's text and fields. Returns whether it existed.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub fn delete_document(conn: &Connection, id: &str) -> Result<bool, DbError> {
    in_transaction(conn, |conn| {
        conn.execute("DELETE FROM extracted_data WHERE file_name = ?", [id])?;
        let removed = conn.execute("DELETE FROM raw_text WHERE file_name = ?", [id])?;
        Ok(removed > 0)
    })
}

/// Parses `DuckDB`'s `TIMESTAMP::TEXT` output (with or without fractional
/// seconds) as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let parsed = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"));

    match parsed {
        Ok(naive) => Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)),
        Err(_) => {
            log::warn!("Failed to parse timestamp: {s:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(entries: &[(&str, Option<&str>)]) -> ExtractionResult {
        entries
            .iter()
            .map(|(k, v)| FieldValue::new(*k, v.map(str::to_owned)))
            .collect()
    }

    #[test]
    fn save_and_read_back() {
        let conn = open_in_memory().unwrap();
        let fields = result(&[("Total", Some("42")), ("Date", None), ("Name", Some("Alice"))]);

        save_document(&conn, "invoice", "Total: 42", &fields).unwrap();

        assert!(document_exists(&conn, "invoice").unwrap());
        assert!(!document_exists(&conn, "other").unwrap());
        assert_eq!(get_raw_text(&conn, "invoice").unwrap().as_deref(), Some("Total: 42"));
        assert_eq!(get_raw_text(&conn, "other").unwrap(), None);
        assert_eq!(get_fields(&conn, "invoice").unwrap(), fields);
    }

    #[test]
    fn replace_fields_drops_old_keys() {
        let conn = open_in_memory().unwrap();
        save_document(
            &conn,
            "doc",
            "text",
            &result(&[("Old", Some("1")), ("Kept", Some("2"))]),
        )
        .unwrap();

        let new = result(&[("Kept", Some("3")), ("New", None)]);
        replace_fields(&conn, "doc", &new).unwrap();

        assert_eq!(get_fields(&conn, "doc").unwrap(), new);
        assert_eq!(get_raw_text(&conn, "doc").unwrap().as_deref(), Some("text"));
    }

    #[test]
    fn resaving_overwrites_text() {
        let conn = open_in_memory().unwrap();
        save_document(&conn, "doc", "first", &result(&[("A", Some("1"))])).unwrap();
        save_document(&conn, "doc", "second", &result(&[("B", None)])).unwrap();

        assert_eq!(get_raw_text(&conn, "doc").unwrap().as_deref(), Some("second"));
        assert_eq!(get_fields(&conn, "doc").unwrap(), result(&[("B", None)]));
        assert_eq!(list_documents(&conn).unwrap().len(), 1);
    }

    #[test]
    fn listing_is_sorted_with_counts() {
        let conn = open_in_memory().unwrap();
        save_document(&conn, "b", "t", &result(&[("X", Some("1")), ("Y", None)])).unwrap();
        save_document(&conn, "a", "t", &result(&[])).unwrap();

        let docs = list_documents(&conn).unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, ["a", "b"]);
        assert_eq!(docs[0].field_count, 0);
        assert_eq!(docs[1].field_count, 2);
        assert_eq!(docs[1].matched_count, 1);
        assert!(docs[1].imported_at.is_some());
    }

    #[test]
    fn all_fields_and_texts_are_sorted() {
        let conn = open_in_memory().unwrap();
        save_document(&conn, "z", "zz", &result(&[("B", Some("1")), ("A", None)])).unwrap();
        save_document(&conn, "m", "mm", &result(&[("C", Some("2"))])).unwrap();

        let rows = get_all_fields(&conn).unwrap();
        let keys: Vec<_> = rows
            .iter()
            .map(|r| (r.file_name.as_str(), r.key.as_str()))
            .collect();
        assert_eq!(keys, [("m", "C"), ("z", "A"), ("z", "B")]);
        assert_eq!(rows[1].value, None);

        let texts = load_all_raw_text(&conn).unwrap();
        assert_eq!(
            texts,
            [
                ("m".to_owned(), "mm".to_owned()),
                ("z".to_owned(), "zz".to_owned())
            ]
        );
    }

    #[test]
    fn delete_removes_text_and_fields() {
        let conn = open_in_memory().unwrap();
        save_document(&conn, "doc", "t", &result(&[("A", Some("1"))])).unwrap();

        assert!(delete_document(&conn, "doc").unwrap());
        assert!(!delete_document(&conn, "doc").unwrap());
        assert!(get_all_fields(&conn).unwrap().is_empty());
        assert!(!document_exists(&conn, "doc").unwrap());
    }

    #[test]
    fn parses_duckdb_timestamp_text() {
        assert!(parse_timestamp("2024-01-15 10:30:00").is_some());
        assert!(parse_timestamp("2024-01-15 10:30:00.123").is_some());
        assert!(parse_timestamp("not a time").is_none());
    }
}
