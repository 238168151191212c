//! Page-ordered text extraction on top of a [`PdfDecoder`](crate::extraction::PdfDecoder).

use crate::extraction::types::{ExtractionError, PdfDecoder};
use std::path::Path;
use std::sync::Arc;

/// Converts downloaded PDFs into plain text, page by page.
#[derive(Clone)]
pub struct TextExtractor {
    decoder: Arc<dyn PdfDecoder>,
}

impl TextExtractor {
    /// Create an extractor over the given decoder.
    pub fn new(decoder: Arc<dyn PdfDecoder>) -> Self {
        Self { decoder }
    }

    /// Extract the text of the PDF at `path`.
    ///
    /// Decoding runs on the blocking pool. An empty result is returned as-is; callers decide
    /// whether empty text is acceptable.
    pub async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ExtractionError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let decoder = Arc::clone(&self.decoder);
        let text = tokio::task::spawn_blocking(move || extract_pages(decoder.as_ref(), &bytes))
            .await
            .map_err(|error| ExtractionError::Aborted(error.to_string()))??;
        tracing::debug!(path = %path.display(), chars = text.chars().count(), "Extracted text");
        Ok(text)
    }
}

/// Open `bytes` and concatenate page texts in ascending page order, with no separator.
pub fn extract_pages(decoder: &dyn PdfDecoder, bytes: &[u8]) -> Result<String, ExtractionError> {
    let pages = decoder.open(bytes)?;
    let page_count = pages.page_count();
    let mut text = String::new();
    for index in 0..page_count {
        text.push_str(&pages.page_text(index)?);
    }
    tracing::trace!(page_count, "Concatenated page text");
    Ok(text)
}
