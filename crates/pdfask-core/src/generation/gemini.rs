//! Google Gemini streaming backend (`streamGenerateContent` with `alt=sse`).

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;

use super::sse::SseDecoder;
use super::{FragmentStream, GenerationBackend, GenerationError};
use crate::Config;

pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiBackend {
    /// Build a backend from process configuration.
    ///
    /// A missing credential is not an error here; every call will fail with
    /// [`GenerationError::MissingCredential`] instead.
    pub fn new(config: &Config) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, self.model
        )
    }

    fn build_request_body(prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        })
    }
}

impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FragmentStream, GenerationError>> + Send + 'a>> {
        Box::pin(async move {
            let api_key = self
                .api_key
                .as_deref()
                .ok_or(GenerationError::MissingCredential)?;

            tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "opening Gemini stream");

            let response = self
                .client
                .post(self.stream_url())
                .header("x-goog-api-key", api_key)
                .json(&Self::build_request_body(prompt))
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(GenerationError::RateLimited);
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(decode_fragments(Box::pin(response.bytes_stream())))
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Finish reasons that end a candidate normally.
const NORMAL_FINISH_REASONS: &[&str] = &["STOP", "MAX_TOKENS", "FINISH_REASON_UNSPECIFIED"];

/// Turn one SSE `data:` payload into a fragment.
///
/// `Ok(None)` means the chunk carried no text (e.g. a final usage-only chunk).
/// A candidate that finishes without text for a reason outside
/// [`NORMAL_FINISH_REASONS`] (`SAFETY`, `RECITATION`, ...) is reported as
/// [`GenerationError::Blocked`].
fn parse_chunk(data: &str) -> Result<Option<String>, GenerationError> {
    let chunk: GenerateContentChunk =
        serde_json::from_str(data).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    if let Some(error) = chunk.error {
        if error.code == 429 {
            return Err(GenerationError::RateLimited);
        }
        return Err(GenerationError::Api {
            status: error.code,
            body: error.message,
        });
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Blocked(reason));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(None);
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(Some(text));
    }

    match candidate.finish_reason {
        Some(reason) if !NORMAL_FINISH_REASONS.contains(&reason.as_str()) => {
            Err(GenerationError::Blocked(reason))
        }
        _ => Ok(None),
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, GenerationError>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn queue(&mut self, data: String) {
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return;
        }
        match parse_chunk(data) {
            Ok(Some(text)) => self.pending.push_back(Ok(text)),
            Ok(None) => {}
            Err(e) => self.pending.push_back(Err(e)),
        }
    }
}

/// Decode a raw SSE byte stream into text fragments.
///
/// The stream ends after the first error.
fn decode_fragments<S, B>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.finished = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.push(chunk.as_ref()) {
                        state.queue(data);
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(GenerationError::Http(e)), state));
                }
                None => {
                    state.finished = true;
                    if let Some(data) = state.decoder.finish() {
                        state.queue(data);
                    }
                }
            }
        }
    }))
}
