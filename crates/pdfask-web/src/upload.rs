use axum::Json;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use pdfask_core::Document;

use crate::models::ErrorResponse;

/// Reasons an upload is rejected before any extraction or model call.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No PDF files provided")]
    NoFiles,
    #[error("No prompt provided")]
    NoPrompt,
    #[error("No selected files")]
    NoSelectedFiles,
    #[error("Failed to read form field: {message}")]
    Malformed { status: StatusCode, message: String },
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        UploadError::Malformed {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::Malformed { status, .. } => *status,
            _ => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Parsed form fields from the multipart upload.
#[derive(Debug)]
pub struct UploadForm {
    /// Uploaded files in the order they appeared in the form.
    pub documents: Vec<Document>,
    pub prompt: String,
}

/// Parse a multipart form upload into the documents and the question.
///
/// Only parts named `pdfs` that carry a filename count as files; a `pdfs`
/// part without one is a plain form value and is ignored.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut documents: Vec<Document> = Vec::new();
    let mut prompt: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "pdfs" => match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let data = field.bytes().await?;
                    documents.push(Document::new(filename, data.to_vec()));
                }
                None => {
                    let _ = field.bytes().await?;
                }
            },
            // A file sent under `prompt` is not a question
            "prompt" if prompt.is_none() && field.file_name().is_none() => {
                prompt = Some(field.text().await?);
            }
            _ => {
                // Ignore unknown and repeated fields
                let _ = field.bytes().await?;
            }
        }
    }

    validate(documents, prompt)
}

/// Apply the rejection rules in order: files, prompt, then selection.
pub fn validate(documents: Vec<Document>, prompt: Option<String>) -> Result<UploadForm, UploadError> {
    if documents.is_empty() {
        return Err(UploadError::NoFiles);
    }
    let prompt = prompt.ok_or(UploadError::NoPrompt)?;
    if documents[0].filename.is_empty() {
        return Err(UploadError::NoSelectedFiles);
    }

    Ok(UploadForm { documents, prompt })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Document {
        Document::new(name, b"%PDF-x".to_vec())
    }

    #[test]
    fn files_checked_before_prompt() {
        assert!(matches!(validate(vec![], None), Err(UploadError::NoFiles)));
    }

    #[test]
    fn missing_prompt() {
        assert!(matches!(
            validate(vec![doc("a.pdf")], None),
            Err(UploadError::NoPrompt)
        ));
    }

    #[test]
    fn prompt_checked_before_selection() {
        assert!(matches!(
            validate(vec![doc("")], None),
            Err(UploadError::NoPrompt)
        ));
    }

    #[test]
    fn unnamed_first_file() {
        assert!(matches!(
            validate(vec![doc(""), doc("b.pdf")], Some("q".into())),
            Err(UploadError::NoSelectedFiles)
        ));
    }

    #[test]
    fn valid_form_keeps_order() {
        let form = validate(vec![doc("b.pdf"), doc("a.pdf")], Some("q".into())).unwrap();
        let names: Vec<_> = form.documents.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf"]);
        assert_eq!(form.prompt, "q");
    }

    #[test]
    fn messages_match_wire_contract() {
        assert_eq!(UploadError::NoFiles.to_string(), "No PDF files provided");
        assert_eq!(UploadError::NoPrompt.to_string(), "No prompt provided");
        assert_eq!(UploadError::NoSelectedFiles.to_string(), "No selected files");
    }
}
