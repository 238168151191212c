//! `lopdf`-backed decoder.

use crate::extraction::types::{DecodeError, PdfDecoder, PdfPages};
use lopdf::Document;

/// Decoder using the pure-Rust `lopdf` parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfDecoder;

impl LopdfDecoder {
    /// Construct the decoder.
    pub const fn new() -> Self {
        Self
    }
}

impl PdfDecoder for LopdfDecoder {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfPages>, DecodeError> {
        let document = Document::load_mem(bytes).map_err(|error| DecodeError::Open(error.to_string()))?;
        // BTreeMap keys: one-based page numbers in ascending order.
        let page_numbers = document.get_pages().into_keys().collect();
        Ok(Box::new(LopdfPages {
            document,
            page_numbers,
        }))
    }
}

struct LopdfPages {
    document: Document,
    page_numbers: Vec<u32>,
}

impl PdfPages for LopdfPages {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, DecodeError> {
        let number = self
            .page_numbers
            .get(index)
            .copied()
            .ok_or_else(|| DecodeError::Page {
                index,
                reason: "page index out of range".into(),
            })?;
        self.document
            .extract_text(&[number])
            .map_err(|error| DecodeError::Page {
                index,
                reason: error.to_string(),
            })
    }
}
