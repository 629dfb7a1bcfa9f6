use crate::{Document, ExtractedDocument, ExtractionResult, PdfBackend};

/// Extract the text of one document without ever failing.
///
/// Any backend error, including an empty upload, is downgraded to
/// [`ExtractionResult::Failed`] so one bad file cannot abort a batch.
pub fn extract_document(backend: &dyn PdfBackend, document: &Document) -> ExtractedDocument {
    let result = if document.data.is_empty() {
        tracing::warn!(filename = %document.filename, "empty upload, skipping extraction");
        ExtractionResult::Failed(crate::BackendError::Empty.to_string())
    } else {
        match backend.extract_text(&document.data) {
            Ok(text) => {
                tracing::debug!(
                    filename = %document.filename,
                    bytes = document.data.len(),
                    chars = text.len(),
                    "extracted text"
                );
                ExtractionResult::Extracted(text)
            }
            Err(e) => {
                tracing::warn!(filename = %document.filename, error = %e, "text extraction failed");
                ExtractionResult::Failed(e.to_string())
            }
        }
    };

    ExtractedDocument {
        filename: document.filename.clone(),
        result,
    }
}
