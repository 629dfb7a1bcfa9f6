use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("empty input")]
    Empty,
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
}

/// Trait for PDF text extraction backends.
///
/// Implementors decode an in-memory PDF and return the plain text of every
/// page, concatenated in page order. Any handle on the underlying document
/// must be released before the call returns.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of a PDF held in memory.
    fn extract_text(&self, data: &[u8]) -> Result<String, BackendError>;
}
