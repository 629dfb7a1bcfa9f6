use std::sync::Arc;
use std::time::Duration;

use pdfask_core::{GenerationBackend, PdfBackend};
use tokio::sync::Semaphore;

/// Shared application state accessible from all handlers.
///
/// Everything here is read-only after startup.
pub struct AppState {
    pub pdf_backend: Arc<dyn PdfBackend>,
    pub generator: Arc<dyn GenerationBackend>,
    pub model: String,
    pub credential_configured: bool,
    pub extraction_timeout: Duration,
    /// Bounds blocking extraction threads, including ones that outlived
    /// their timeout.
    pub extraction_permits: Arc<Semaphore>,
}
