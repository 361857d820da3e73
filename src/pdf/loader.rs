//! PDF loading via MuPDF
//!
//! Validates that a buffer is a PDF and hands out short-lived MuPDF
//! documents for read-only work (page count, rendering). Also rewrites
//! damaged files through MuPDF's PDF writer so stricter parsers can read
//! them.
//!
//! MuPDF documents are not `Send`, so a [`PdfSource`] only keeps the bytes.
//! A fresh `mupdf::Document` is opened for each operation and dropped when
//! the closure returns, on success and on error alike.

use std::sync::Arc;

use mupdf::pdf::PdfDocument;
use mupdf::Document;

use crate::document::{DocumentError, DocumentResult};

/// MIME type handed to MuPDF when opening from memory
pub const PDF_MIME: &str = "application/pdf";

/// How far into the buffer the `%PDF-` header may start
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Check for a `%PDF-` header near the start of the buffer.
///
/// Readers tolerate a little leading garbage, so the header does not have
/// to sit at offset 0.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Validated, reopenable PDF bytes
#[derive(Clone)]
pub struct PdfSource {
    data: Arc<Vec<u8>>,
    page_count: usize,
}

impl PdfSource {
    /// Validate `data` as a PDF and record its page count
    pub fn from_bytes(data: Vec<u8>) -> DocumentResult<Self> {
        if data.is_empty() {
            return Err(DocumentError::ParseError("Empty document".into()));
        }
        if !has_pdf_magic(&data) {
            return Err(DocumentError::ParseError("Missing %PDF header".into()));
        }

        let doc = open(&data)?;
        let page_count = doc
            .page_count()
            .map_err(|e| DocumentError::ParseError(e.to_string()))?;
        let page_count = usize::try_from(page_count)
            .map_err(|_| DocumentError::ParseError(format!("Invalid page count {}", page_count)))?;

        Ok(Self {
            data: Arc::new(data),
            page_count,
        })
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Execute a closure with a freshly opened document
    pub fn with_doc<F, R>(&self, f: F) -> DocumentResult<R>
    where
        F: FnOnce(&Document) -> DocumentResult<R>,
    {
        let doc = open(&self.data)?;
        f(&doc)
    }
}

/// Rewrite a PDF through MuPDF's writer.
///
/// MuPDF rebuilds a broken or stale cross-reference table while opening,
/// and a full (non-incremental) save writes a fresh one.
pub fn rewrite_pdf(data: &[u8]) -> DocumentResult<Vec<u8>> {
    let doc = PdfDocument::from_bytes(data).map_err(|e| DocumentError::ParseError(e.to_string()))?;

    let mut output = Vec::new();
    doc.write_to(&mut output)
        .map_err(|e| DocumentError::SerializationError(e.to_string()))?;
    Ok(output)
}

fn open(data: &[u8]) -> DocumentResult<Document> {
    Document::from_bytes(data, PDF_MIME).map_err(|e| DocumentError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;

    #[test]
    fn test_pdf_magic_at_start() {
        assert!(has_pdf_magic(b"%PDF-1.7\n..."));
    }

    #[test]
    fn test_pdf_magic_after_leading_garbage() {
        let mut data = vec![b' '; 100];
        data.extend_from_slice(b"%PDF-1.4");
        assert!(has_pdf_magic(&data));
    }

    #[test]
    fn test_pdf_magic_rejects_other_formats() {
        assert!(!has_pdf_magic(b"PK\x03\x04 not a pdf"));
        assert!(!has_pdf_magic(b""));
        assert!(!has_pdf_magic(b"%PDF"));
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let result = PdfSource::from_bytes(b"hello world".to_vec());
        assert!(matches!(result, Err(DocumentError::ParseError(_))));
    }

    #[test]
    fn test_rejects_empty_bytes() {
        let result = PdfSource::from_bytes(Vec::new());
        assert!(matches!(result, Err(DocumentError::ParseError(_))));
    }

    #[test]
    fn test_page_count_and_bounds() {
        let source = PdfSource::from_bytes(fixtures::sample_pdf(3)).unwrap();
        assert_eq!(source.page_count(), 3);

        let (width, height) = source
            .with_doc(|doc| {
                let bounds = doc.load_page(0)?.bounds()?;
                Ok((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
            })
            .unwrap();
        assert!((width - 612.0).abs() < 0.5);
        assert!((height - 792.0).abs() < 0.5);
    }

    #[test]
    fn test_stale_xref_opens_and_rewrites() {
        let stale = fixtures::stale_xref_pdf(2);
        assert!(lopdf::Document::load_mem(&stale).is_err());

        let source = PdfSource::from_bytes(stale.clone()).unwrap();
        assert_eq!(source.page_count(), 2);

        let rewritten = rewrite_pdf(&stale).unwrap();
        let doc = lopdf::Document::load_mem(&rewritten).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_rewrite_rejects_garbage() {
        assert!(rewrite_pdf(b"GIF89a not a pdf").is_err());
    }
}
