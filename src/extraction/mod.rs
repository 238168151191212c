//! PDF text extraction: decoder contract, the `lopdf` backend, and the page-ordered extractor.

mod extractor;
pub mod lopdf_decoder;
pub mod types;

pub use extractor::{TextExtractor, extract_pages};
pub use lopdf_decoder::LopdfDecoder;
pub use types::{DecodeError, ExtractionError, PdfDecoder, PdfPages};
