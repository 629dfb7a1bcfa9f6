use serde::Serialize;

/// JSON body of every pre-stream rejection.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub credential_configured: bool,
}
