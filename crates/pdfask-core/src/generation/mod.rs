//! Text-generation backend trait and the Gemini implementation.

pub mod gemini;
pub mod sse;

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited or out of quota")]
    RateLimited,
    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("malformed stream chunk: {0}")]
    Malformed(String),
}

/// Fragments of generated text in the order the backend produced them.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// A backend that turns a prompt into a stream of text fragments.
pub trait GenerationBackend: Send + Sync {
    /// Human-readable name used in logs (e.g. "Gemini").
    fn name(&self) -> &str;

    /// Open a streaming generation call.
    ///
    /// Errors that happen before the first fragment (bad credential, HTTP
    /// status) are returned here; later ones arrive inside the stream.
    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FragmentStream, GenerationError>> + Send + 'a>>;
}
