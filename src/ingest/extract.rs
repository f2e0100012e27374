//! Text extraction from uploaded files.
//!
//! Extraction for binary formats (PDF, DOCX) is an external concern; the
//! `TextExtractor` trait is the seam where such a reader plugs in. The
//! built-in implementation handles plain-text formats.

use std::fs;
use std::path::Path;

use crate::core::errors::ApiError;

/// Lowercased extension of a filename, dot included (`".txt"`).
/// Empty string when the filename has no extension.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

pub trait TextExtractor: Send + Sync {
    /// Extract plain text from the file at `path`, dispatched on the
    /// dot-prefixed lowercased extension.
    fn extract(&self, path: &Path, file_type: &str) -> Result<String, ApiError>;
}

/// Built-in extractor for plain-text formats.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path, file_type: &str) -> Result<String, ApiError> {
        match file_type {
            ".txt" | ".md" => {
                let text = fs::read_to_string(path).map_err(ApiError::internal)?;
                Ok(text.trim().to_string())
            }
            other => Err(ApiError::Internal(format!(
                "no text extractor registered for {} files",
                if other.is_empty() { "extensionless" } else { other }
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(extension_of("Report.TXT"), ".txt");
        assert_eq!(extension_of("notes.md"), ".md");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
    }

    #[test]
    fn plain_text_extraction_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "  hello world \n").unwrap();

        let text = PlainTextExtractor.extract(&path, ".txt").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn unsupported_format_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let err = PlainTextExtractor.extract(&path, ".pdf").unwrap_err();
        assert!(err.to_string().contains(".pdf"));
    }
}
