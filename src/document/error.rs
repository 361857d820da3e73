//! Document error types
//!
//! Error handling for the render / overlay / serialize pipeline.

use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Bytes are not a readable PDF
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Input decoded but its content is unusable (encoding, format)
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Failed to render a page
    #[error("Render error: {0}")]
    RenderError(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    ImageError(String),

    /// Failed to write the document back to bytes
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// MuPDF context error
    #[error("MuPDF context error: {0}")]
    ContextError(String),

    /// lopdf object model error
    #[error("PDF object error: {0}")]
    Lopdf(String),
}

impl DocumentError {
    /// Whether the caller can fix this error by sending different input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocumentError::ParseError(_) | DocumentError::InvalidContent(_)
        )
    }
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias for Result (used across the pipeline)
pub type DocumentResult<T> = Result<T>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::ContextError(err.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        DocumentError::Lopdf(err.to_string())
    }
}

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        DocumentError::ImageError(err.to_string())
    }
}
