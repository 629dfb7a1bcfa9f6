use std::io::Write;

use owo_colors::OwoColorize;
use pdfask_core::{ExtractedDocument, ExtractionResult};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one line per document describing how extraction went.
pub fn print_document_status(
    w: &mut dyn Write,
    index: usize,
    total: usize,
    document: &ExtractedDocument,
    color: ColorMode,
) -> std::io::Result<()> {
    let idx = index + 1;
    match &document.result {
        ExtractionResult::Extracted(text) if text.trim().is_empty() => {
            if color.enabled() {
                writeln!(
                    w,
                    "[{}/{}] {} -> {}",
                    idx,
                    total,
                    document.filename,
                    "NO TEXT".yellow()
                )
            } else {
                writeln!(w, "[{}/{}] {} -> NO TEXT", idx, total, document.filename)
            }
        }
        ExtractionResult::Extracted(text) => {
            let chars = text.chars().count();
            if color.enabled() {
                writeln!(
                    w,
                    "[{}/{}] {} -> {} ({} chars)",
                    idx,
                    total,
                    document.filename,
                    "EXTRACTED".green(),
                    chars
                )
            } else {
                writeln!(
                    w,
                    "[{}/{}] {} -> EXTRACTED ({} chars)",
                    idx, total, document.filename, chars
                )
            }
        }
        ExtractionResult::Failed(reason) => {
            if color.enabled() {
                writeln!(
                    w,
                    "[{}/{}] {} -> {} ({})",
                    idx,
                    total,
                    document.filename,
                    "FAILED".red(),
                    reason.dimmed()
                )
            } else {
                writeln!(
                    w,
                    "[{}/{}] {} -> FAILED ({})",
                    idx, total, document.filename, reason
                )
            }
        }
    }
}

/// Print the line shown before the answer starts streaming.
pub fn print_asking(w: &mut dyn Write, model: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "Asking {}...", model.bold())?;
    } else {
        writeln!(w, "Asking {}...", model)?;
    }
    writeln!(w)
}

pub fn print_warning(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "WARNING:".yellow(), message)
    } else {
        writeln!(w, "WARNING: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(document: &ExtractedDocument) -> String {
        let mut buf = Vec::new();
        print_document_status(&mut buf, 0, 2, document, ColorMode(false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn extracted_document_reports_char_count() {
        let doc = ExtractedDocument {
            filename: "paper.pdf".into(),
            result: ExtractionResult::Extracted("héllo".into()),
        };
        assert_eq!(render(&doc), "[1/2] paper.pdf -> EXTRACTED (5 chars)\n");
    }

    #[test]
    fn blank_text_is_flagged() {
        let doc = ExtractedDocument {
            filename: "scan.pdf".into(),
            result: ExtractionResult::Extracted(" \n".into()),
        };
        assert_eq!(render(&doc), "[1/2] scan.pdf -> NO TEXT\n");
    }

    #[test]
    fn failure_includes_reason() {
        let doc = ExtractedDocument {
            filename: "notes.txt".into(),
            result: ExtractionResult::Failed("not a PDF".into()),
        };
        assert_eq!(render(&doc), "[1/2] notes.txt -> FAILED (not a PDF)\n");
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let mut buf = Vec::new();
        print_asking(&mut buf, "gemini-2.5-flash", ColorMode(false)).unwrap();
        print_warning(&mut buf, "careful", ColorMode(false)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains('\u{1b}'));
        assert_eq!(text, "Asking gemini-2.5-flash...\n\nWARNING: careful\n");
    }
}
