//! PDF text extraction boundary.
//!
//! The contract the rest of the engine depends on is `bytes -> ordered page texts`
//! (spec §1 "Out of scope... PDF-to-text extractor"). `PdfTextExtractor` is the trait
//! that boundary is expressed as; `PdfExtractAdapter` is the default implementation so
//! the binary compiles and runs end-to-end.

use crate::errors::{IngestError, Result};
use async_trait::async_trait;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Converts PDF bytes into an ordered sequence of page texts.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    /// Extract page texts from a PDF file on disk, in document order.
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;

    /// Convenience: the whole document as one string, pages joined by a blank line.
    async fn extract_full_text(&self, path: &Path) -> Result<String> {
        let pages = self.extract_pages(path).await?;
        Ok(pages.join("\n\n"))
    }
}

/// Default adapter backed by the `pdf-extract` crate.
///
/// `pdf-extract` does not expose a page-boundary API directly; it extracts whole-document
/// text with form-feed (`\x0c`) characters between pages, which this adapter splits on.
pub struct PdfExtractAdapter;

impl PdfExtractAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PdfTextExtractor for PdfExtractAdapter {
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| IngestError::UnreadableInput {
                path: path_display(&path),
                reason: format!("extraction task panicked: {}", e),
            })?
            .map_err(|e| IngestError::UnreadableInput {
                path: path_display(&path),
                reason: e.to_string(),
            })?;

        let pages: Vec<String> = text
            .split('\x0c')
            .map(|page| normalize_extracted_text(page.trim()))
            .filter(|page| !page.is_empty())
            .collect();

        if pages.is_empty() {
            return Ok(vec![normalize_extracted_text(text.trim())]);
        }

        Ok(pages)
    }
}

/// PDF text extractors frequently emit decomposed accents and ligature-adjacent code
/// points that don't match the precomposed forms a human would type; normalize to NFC so
/// downstream tokenization and citation matching see one canonical form per character.
fn normalize_extracted_text(page: &str) -> String {
    page.nfc().collect()
}

fn path_display(path: &std::path::Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedExtractor(Vec<String>);

    #[async_trait]
    impl PdfTextExtractor for FixedExtractor {
        async fn extract_pages(&self, _path: &Path) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn full_text_joins_pages() {
        let extractor = FixedExtractor(vec!["page one".to_string(), "page two".to_string()]);
        let text = extractor.extract_full_text(Path::new("dummy.pdf")).await.unwrap();
        assert_eq!(text, "page one\n\npage two");
    }

    #[test]
    fn normalizes_decomposed_accents_to_nfc() {
        let decomposed = "re\u{0301}sume\u{0301}"; // e + combining acute, twice
        assert_eq!(normalize_extracted_text(decomposed), "résumé");
    }
}
