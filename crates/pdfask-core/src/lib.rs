use std::time::Duration;

pub mod backend;
pub mod config_file;
pub mod corpus;
pub mod extract;
pub mod generation;
pub mod prompt;
pub mod relay;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use corpus::{CombinedCorpus, end_marker, start_marker};
pub use extract::extract_document;
pub use generation::gemini::GeminiBackend;
pub use generation::{FragmentStream, GenerationBackend, GenerationError};
pub use prompt::compose_prompt;
pub use relay::{MODEL_ERROR_MESSAGE, relay};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// An uploaded document. Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Outcome of extracting text from a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Extracted(String),
    Failed(String),
}

impl ExtractionResult {
    /// The extracted text, or `""` when extraction failed.
    pub fn text(&self) -> &str {
        match self {
            ExtractionResult::Extracted(text) => text,
            ExtractionResult::Failed(_) => "",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExtractionResult::Failed(_))
    }
}

/// A document after extraction, ready to be placed in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub filename: String,
    pub result: ExtractionResult,
}

/// Process-wide generation backend configuration.
///
/// Built once at startup and passed by reference to whatever needs it.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Resolve configuration from a loaded config file.
    ///
    /// A credential taken from the environment wins over the one in the file.
    /// Empty strings count as absent.
    pub fn from_file(file: &config_file::ConfigFile, env_api_key: Option<String>) -> Self {
        let defaults = Config::default();
        let model = file.model.as_ref();

        let api_key = env_api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                file.api_keys
                    .as_ref()
                    .and_then(|a| a.google_api_key.clone())
                    .filter(|k| !k.trim().is_empty())
            });

        Self {
            api_key,
            model: model
                .and_then(|m| m.name.clone())
                .unwrap_or(defaults.model),
            api_base: model
                .and_then(|m| m.api_base.clone())
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            connect_timeout_secs: model
                .and_then(|m| m.connect_timeout_secs)
                .unwrap_or(defaults.connect_timeout_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_file::{ApiKeysConfig, ConfigFile, ModelConfig};

    #[test]
    fn defaults_without_file_or_env() {
        let config = Config::from_file(&ConfigFile::default(), None);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(!config.has_credential());
    }

    #[test]
    fn env_credential_overrides_file() {
        let file = ConfigFile {
            api_keys: Some(ApiKeysConfig {
                google_api_key: Some("from-file".into()),
            }),
            ..Default::default()
        };
        let config = Config::from_file(&file, Some("from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("from-env"));

        let config = Config::from_file(&file, None);
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn blank_env_credential_is_ignored() {
        let config = Config::from_file(&ConfigFile::default(), Some("  ".into()));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn model_section_applies() {
        let file = ConfigFile {
            model: Some(ModelConfig {
                name: Some("gemini-2.0-flash".into()),
                api_base: Some("http://localhost:9000/v1beta/".into()),
                connect_timeout_secs: Some(3),
            }),
            ..Default::default()
        };
        let config = Config::from_file(&file, None);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn debug_masks_credential() {
        let config = Config {
            api_key: Some("super-secret".into()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn failed_extraction_has_empty_text() {
        let failed = ExtractionResult::Failed("corrupt".into());
        assert_eq!(failed.text(), "");
        assert!(failed.is_failed());
        assert_eq!(ExtractionResult::Extracted("hi".into()).text(), "hi");
    }
}
