//! Marker-delimited concatenation of extracted documents.

use std::fmt;

use crate::ExtractedDocument;

pub fn start_marker(filename: &str) -> String {
    format!("--- START OF DOCUMENT: {} ---", filename)
}

pub fn end_marker(filename: &str) -> String {
    format!("--- END OF DOCUMENT: {} ---", filename)
}

/// One block per submitted document, in upload order.
///
/// Every document gets a start/end marker pair, including documents whose
/// extraction failed or produced no text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedCorpus {
    blocks: Vec<CorpusBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CorpusBlock {
    filename: String,
    body: String,
}

impl CombinedCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: &ExtractedDocument) {
        self.blocks.push(CorpusBlock {
            filename: document.filename.clone(),
            body: document.result.text().to_string(),
        });
    }

    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a ExtractedDocument>) -> Self {
        let mut corpus = Self::new();
        for document in documents {
            corpus.push(document);
        }
        corpus
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Filenames in corpus order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.filename.as_str())
    }
}

impl fmt::Display for CombinedCorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{}\n\n", start_marker(&block.filename))?;
            if !block.body.is_empty() {
                write!(f, "{}\n\n", block.body)?;
            }
            write!(f, "{}\n\n", end_marker(&block.filename))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionResult;

    fn doc(name: &str, result: ExtractionResult) -> ExtractedDocument {
        ExtractedDocument {
            filename: name.to_string(),
            result,
        }
    }

    #[test]
    fn renders_exact_layout() {
        let corpus = CombinedCorpus::from_documents(&[doc(
            "a.pdf",
            ExtractionResult::Extracted("Alpha".into()),
        )]);
        assert_eq!(
            corpus.to_string(),
            "--- START OF DOCUMENT: a.pdf ---\n\nAlpha\n\n--- END OF DOCUMENT: a.pdf ---\n\n"
        );
    }

    #[test]
    fn failed_document_keeps_markers_with_empty_body() {
        let corpus = CombinedCorpus::from_documents(&[doc(
            "broken.pdf",
            ExtractionResult::Failed("corrupt".into()),
        )]);
        assert_eq!(
            corpus.to_string(),
            "--- START OF DOCUMENT: broken.pdf ---\n\n--- END OF DOCUMENT: broken.pdf ---\n\n"
        );
    }

    #[test]
    fn preserves_upload_order() {
        let docs = [
            doc("z.pdf", ExtractionResult::Extracted("last letter".into())),
            doc("a.pdf", ExtractionResult::Failed("bad".into())),
            doc("m.pdf", ExtractionResult::Extracted(String::new())),
        ];
        let corpus = CombinedCorpus::from_documents(&docs);
        let rendered = corpus.to_string();

        assert_eq!(corpus.len(), 3);
        assert_eq!(
            corpus.filenames().collect::<Vec<_>>(),
            vec!["z.pdf", "a.pdf", "m.pdf"]
        );
        assert_eq!(rendered.matches("--- START OF DOCUMENT:").count(), 3);
        assert_eq!(rendered.matches("--- END OF DOCUMENT:").count(), 3);

        let z = rendered.find(&start_marker("z.pdf")).unwrap();
        let a = rendered.find(&start_marker("a.pdf")).unwrap();
        let m = rendered.find(&start_marker("m.pdf")).unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn duplicate_filenames_each_get_markers() {
        let docs = [
            doc("same.pdf", ExtractionResult::Extracted("one".into())),
            doc("same.pdf", ExtractionResult::Extracted("two".into())),
        ];
        let rendered = CombinedCorpus::from_documents(&docs).to_string();
        assert_eq!(rendered.matches(&start_marker("same.pdf")).count(), 2);
        assert_eq!(rendered.matches(&end_marker("same.pdf")).count(), 2);
    }

    #[test]
    fn empty_corpus_renders_nothing() {
        assert!(CombinedCorpus::new().is_empty());
        assert_eq!(CombinedCorpus::new().to_string(), "");
    }
}
