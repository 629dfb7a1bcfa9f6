use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use pdfask_core::{
    CombinedCorpus, Document, ExtractedDocument, ExtractionResult, GenerationBackend,
    compose_prompt, extract_document, relay,
};

use crate::state::AppState;
use crate::upload::{self, UploadError};

/// Bound on fragments buffered between the model and a slow client.
const FRAGMENT_BUFFER: usize = 32;

/// `POST /api/process-pdf`
///
/// Validation failures are answered immediately with a 400. After that the
/// response is committed as `200 text/plain` and model failures show up as
/// text in the body.
pub async fn process_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "request is not a multipart upload");
            return UploadError::NoFiles.into_response();
        }
    };

    let form = match upload::parse_multipart(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "rejected upload");
            return e.into_response();
        }
    };

    tracing::info!(
        documents = form.documents.len(),
        prompt_chars = form.prompt.len(),
        "processing upload"
    );

    // Sequential on purpose: output order must follow upload order.
    let mut extracted = Vec::with_capacity(form.documents.len());
    for document in form.documents {
        extracted.push(extract_blocking(&state, document).await);
    }

    let failed = extracted.iter().filter(|d| d.result.is_failed()).count();
    if failed > 0 {
        tracing::warn!(failed, total = extracted.len(), "some documents produced no text");
    }

    let corpus = CombinedCorpus::from_documents(&extracted);
    let prompt = compose_prompt(&form.prompt, &corpus);
    tracing::debug!(
        files = ?corpus.filenames().collect::<Vec<_>>(),
        prompt_chars = prompt.len(),
        "prompt composed"
    );

    let (tx, rx) = mpsc::channel::<String>(FRAGMENT_BUFFER);
    tokio::spawn(pump_fragments(Arc::clone(&state.generator), prompt, tx));

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// Extract one document on the blocking pool (MuPDF is not async).
///
/// The blocking thread cannot be interrupted, so it holds its extraction
/// permit until it really finishes. Waiting for a permit counts against the
/// timeout.
async fn extract_blocking(state: &AppState, document: Document) -> ExtractedDocument {
    let filename = document.filename.clone();
    let backend = Arc::clone(&state.pdf_backend);
    let permits = Arc::clone(&state.extraction_permits);

    let work = async move {
        let permit = permits
            .acquire_owned()
            .await
            .map_err(|e| format!("extraction pool closed: {e}"))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            extract_document(backend.as_ref(), &document)
        })
        .await
        .map_err(|e| format!("task join error: {e}"))
    };

    let reason = match tokio::time::timeout(state.extraction_timeout, work).await {
        Ok(Ok(extracted)) => return extracted,
        Ok(Err(reason)) => reason,
        Err(_) => "extraction timed out".to_string(),
    };

    tracing::warn!(filename = %filename, reason = %reason, "text extraction aborted");
    ExtractedDocument {
        filename,
        result: ExtractionResult::Failed(reason),
    }
}

/// Drive the relay into the response channel until it ends or the client
/// goes away. A closed channel cancels the upstream generation call.
pub(crate) async fn pump_fragments(
    generator: Arc<dyn GenerationBackend>,
    prompt: String,
    tx: mpsc::Sender<String>,
) {
    let cancel = CancellationToken::new();
    let mut fragments = std::pin::pin!(relay(generator, prompt, cancel.clone()));

    loop {
        tokio::select! {
            next = fragments.next() => {
                let Some(fragment) = next else {
                    break;
                };
                if tx.send(fragment).await.is_err() {
                    tracing::info!("client disconnected, cancelling generation");
                    cancel.cancel();
                    break;
                }
            }
            _ = tx.closed() => {
                tracing::info!("client disconnected, cancelling generation");
                cancel.cancel();
                break;
            }
        }
    }
}
