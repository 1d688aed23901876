//! Plain-text provider for documents whose text was extracted elsewhere.

use std::path::Path;

use crate::{TextError, TextProvider};

/// Reads UTF-8 text files verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextProvider;

impl TextProvider for PlainTextProvider {
    fn extract_text(&self, path: &Path) -> Result<String, TextError> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Read {} characters from {}", text.chars().count(), path.display());
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
