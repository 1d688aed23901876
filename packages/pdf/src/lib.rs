#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Document text providers.
//!
//! Turns a document on disk into the single string of text that field
//! extraction runs over. PDFs go through pure-Rust text extraction
//! ([`pdf_extract`]); plain-text files are read as-is so that text
//! extracted elsewhere can be imported too.
//!
//! A provider failure means "no text available" for that one document.
//! Callers skip the document and carry on with the rest of the batch.

pub mod plain;

use std::path::Path;

pub use plain::PlainTextProvider;

/// Errors from reading a document's text.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// No provider handles this kind of file.
    #[error("Unsupported document type: {0}")]
    UnsupportedFormat(String),

    /// The path has no usable file name.
    #[error("Invalid document file name: {0}")]
    InvalidFileName(String),
}

/// Something that can produce the full text of a document.
pub trait TextProvider {
    /// Returns the full extracted text of the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError`] if the document cannot be read or decoded.
    fn extract_text(&self, path: &Path) -> Result<String, TextError>;

    /// Short name used in log messages.
    fn name(&self) -> &'static str;
}

/// Extracts text from PDF files with [`pdf_extract`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextProvider;

impl PdfTextProvider {
    /// Extracts text from PDF bytes already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Extraction`] if the bytes are not a readable PDF.
    pub fn extract_from_mem(bytes: &[u8]) -> Result<String, TextError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| TextError::Extraction(format!("failed to extract text from PDF: {e}")))
    }
}

impl TextProvider for PdfTextProvider {
    fn extract_text(&self, path: &Path) -> Result<String, TextError> {
        let bytes = std::fs::read(path)?;

        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let text = Self::extract_from_mem(&bytes)?;

        log::debug!(
            "Extracted {} characters of text from {}",
            text.chars().count(),
            path.display()
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Picks a provider from the file extension: `.pdf` files go to
/// [`PdfTextProvider`], `.txt` files to [`PlainTextProvider`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoTextProvider {
    pdf: PdfTextProvider,
    plain: PlainTextProvider,
}

impl AutoTextProvider {
    /// Creates a provider that dispatches on file extension.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pdf: PdfTextProvider,
            plain: PlainTextProvider,
        }
    }
}

impl TextProvider for AutoTextProvider {
    fn extract_text(&self, path: &Path) -> Result<String, TextError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("pdf") => self.pdf.extract_text(path),
            Some("txt") => self.plain.extract_text(path),
            Some(other) => Err(TextError::UnsupportedFormat(other.to_owned())),
            None => Err(TextError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "auto"
    }
}

/// Derives a document identifier from its path: the file name with its
/// last extension removed (`scan.2024.pdf` becomes `scan.2024`).
///
/// # Errors
///
/// Returns [`TextError::InvalidFileName`] if the path has no UTF-8 file
/// name or the identifier would be empty.
pub fn document_id(path: &Path) -> Result<String, TextError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TextError::InvalidFileName(path.display().to_string()))?;

    let id = name.rsplit_once('.').map_or(name, |(stem, _)| stem);

    if id.is_empty() {
        return Err(TextError::InvalidFileName(name.to_owned()));
    }

    Ok(id.to_owned())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn document_id_strips_last_extension_only() {
        assert_eq!(document_id(Path::new("/in/invoice.pdf")).unwrap(), "invoice");
        assert_eq!(document_id(Path::new("scan.2024.pdf")).unwrap(), "scan.2024");
        assert_eq!(document_id(Path::new("README")).unwrap(), "README");
    }

    #[test]
    fn document_id_rejects_empty_names() {
        assert!(matches!(
            document_id(Path::new(".pdf")),
            Err(TextError::InvalidFileName(_))
        ));
        assert!(document_id(&PathBuf::from("/")).is_err());
    }

    #[test]
    fn garbage_bytes_are_an_extraction_error() {
        let err = PdfTextProvider::extract_from_mem(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, TextError::Extraction(_)));
    }

    #[test]
    fn auto_provider_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("notes.TXT");
        std::fs::write(&txt, "Total: 42").unwrap();
        assert_eq!(AutoTextProvider::new().extract_text(&txt).unwrap(), "Total: 42");

        let pdf = dir.path().join("broken.pdf");
        std::fs::write(&pdf, "not a pdf").unwrap();
        assert!(matches!(
            AutoTextProvider::new().extract_text(&pdf),
            Err(TextError::Extraction(_))
        ));

        let docx = dir.path().join("letter.docx");
        std::fs::write(&docx, "x").unwrap();
        assert!(matches!(
            AutoTextProvider::new().extract_text(&docx),
            Err(TextError::UnsupportedFormat(ext)) if ext == "docx"
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PdfTextProvider
            .extract_text(Path::new("/nonexistent/pdf_fields/missing.pdf"))
            .unwrap_err();
        assert!(matches!(err, TextError::Io(_)));
    }
}
