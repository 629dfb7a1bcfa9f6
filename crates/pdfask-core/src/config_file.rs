use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysConfig>,
    pub model: Option<ModelConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub google_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub api_base: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_mb: Option<usize>,
    pub extraction_timeout_secs: Option<u64>,
    pub max_concurrent_extractions: Option<usize>,
    pub static_dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/pdfask/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdfask").join("config.toml"))
}

/// Load config by cascading CWD `.pdfask.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".pdfask.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed; a parse failure is logged.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_keys = base.api_keys.unwrap_or_default();
    let overlay_keys = overlay.api_keys.unwrap_or_default();
    let base_model = base.model.unwrap_or_default();
    let overlay_model = overlay.model.unwrap_or_default();
    let base_server = base.server.unwrap_or_default();
    let overlay_server = overlay.server.unwrap_or_default();

    ConfigFile {
        api_keys: Some(ApiKeysConfig {
            google_api_key: overlay_keys.google_api_key.or(base_keys.google_api_key),
        }),
        model: Some(ModelConfig {
            name: overlay_model.name.or(base_model.name),
            api_base: overlay_model.api_base.or(base_model.api_base),
            connect_timeout_secs: overlay_model
                .connect_timeout_secs
                .or(base_model.connect_timeout_secs),
        }),
        server: Some(ServerConfig {
            host: overlay_server.host.or(base_server.host),
            port: overlay_server.port.or(base_server.port),
            max_upload_mb: overlay_server.max_upload_mb.or(base_server.max_upload_mb),
            extraction_timeout_secs: overlay_server
                .extraction_timeout_secs
                .or(base_server.extraction_timeout_secs),
            max_concurrent_extractions: overlay_server
                .max_concurrent_extractions
                .or(base_server.max_concurrent_extractions),
            static_dir: overlay_server.static_dir.or(base_server.static_dir),
        }),
    }
}
