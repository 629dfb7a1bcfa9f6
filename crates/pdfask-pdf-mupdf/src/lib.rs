use mupdf::{Document, TextPageFlags};

use pdfask_core::{BackendError, PdfBackend};

const PDF_MAGIC: &str = "application/pdf";

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so the rest of the workspace does not link it
/// transitively.
///
/// Pages are read in order and their text concatenated with no separator;
/// each text line ends with `\n`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, data: &[u8]) -> Result<String, BackendError> {
        if data.is_empty() {
            return Err(BackendError::Empty);
        }

        // Dropped at the end of this call, releasing the MuPDF handle.
        let document = Document::from_bytes(data, PDF_MAGIC)
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut text = String::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            for block in text_page.blocks() {
                for line in block.lines() {
                    text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                    text.push('\n');
                }
            }
        }

        Ok(text)
    }
}
