//! Forwards generated fragments to the caller as they arrive.

use std::sync::Arc;

use futures_util::stream::{self, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{FragmentStream, GenerationBackend};

/// Terminal fragment emitted when the backend fails at any point.
pub const MODEL_ERROR_MESSAGE: &str = "Error: Could not get response from the model.";

enum RelayState {
    Pending {
        backend: Arc<dyn GenerationBackend>,
        prompt: String,
        cancel: CancellationToken,
    },
    Streaming {
        fragments: FragmentStream,
        cancel: CancellationToken,
        forwarded: usize,
    },
    Done,
}

/// Relay a streaming generation call.
///
/// The returned stream is lazy: nothing is sent to the backend until it is
/// first polled. Fragments come out in backend order; empty ones are dropped.
/// A backend failure yields [`MODEL_ERROR_MESSAGE`] once and ends the stream.
/// Cancelling `cancel` ends the stream quietly and drops the backend call.
pub fn relay(
    backend: Arc<dyn GenerationBackend>,
    prompt: String,
    cancel: CancellationToken,
) -> impl Stream<Item = String> + Send + 'static {
    let state = RelayState::Pending {
        backend,
        prompt,
        cancel,
    };

    stream::unfold(state, |state| async move {
        let (mut fragments, cancel, mut forwarded) = match state {
            RelayState::Done => return None,
            RelayState::Pending {
                backend,
                prompt,
                cancel,
            } => {
                let opened = tokio::select! {
                    opened = backend.generate_stream(&prompt) => opened,
                    _ = cancel.cancelled() => {
                        tracing::debug!(backend = backend.name(), "relay cancelled before stream opened");
                        return None;
                    }
                };
                match opened {
                    Ok(fragments) => (fragments, cancel, 0),
                    Err(e) => {
                        tracing::error!(backend = backend.name(), error = %e, "failed to open generation stream");
                        return Some((MODEL_ERROR_MESSAGE.to_string(), RelayState::Done));
                    }
                }
            }
            RelayState::Streaming {
                fragments,
                cancel,
                forwarded,
            } => (fragments, cancel, forwarded),
        };

        loop {
            let next = tokio::select! {
                next = fragments.next() => next,
                _ = cancel.cancelled() => {
                    tracing::debug!(forwarded, "relay cancelled mid-stream");
                    return None;
                }
            };

            match next {
                Some(Ok(text)) if text.is_empty() => continue,
                Some(Ok(text)) => {
                    forwarded += 1;
                    return Some((
                        text,
                        RelayState::Streaming {
                            fragments,
                            cancel,
                            forwarded,
                        },
                    ));
                }
                Some(Err(e)) => {
                    tracing::error!(forwarded, error = %e, "generation stream failed");
                    return Some((MODEL_ERROR_MESSAGE.to_string(), RelayState::Done));
                }
                None => {
                    tracing::debug!(forwarded, "generation stream finished");
                    return None;
                }
            }
        }
    })
}
