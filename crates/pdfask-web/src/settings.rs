use std::path::PathBuf;
use std::time::Duration;

use pdfask_core::config_file::ConfigFile;

/// Server-side settings resolved from the `[server]` config section.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
    pub extraction_timeout_secs: u64,
    pub max_concurrent_extractions: usize,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_mb: 100,
            extraction_timeout_secs: 30,
            max_concurrent_extractions: 4,
            static_dir: None,
        }
    }
}

impl ServerSettings {
    pub fn from_file(file: &ConfigFile) -> Self {
        let defaults = Self::default();
        let Some(server) = file.server.as_ref() else {
            return defaults;
        };

        Self {
            host: server.host.clone().unwrap_or(defaults.host),
            port: server.port.unwrap_or(defaults.port),
            max_upload_mb: server.max_upload_mb.unwrap_or(defaults.max_upload_mb),
            extraction_timeout_secs: server
                .extraction_timeout_secs
                .unwrap_or(defaults.extraction_timeout_secs),
            max_concurrent_extractions: server
                .max_concurrent_extractions
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_extractions),
            static_dir: server.static_dir.as_ref().map(PathBuf::from),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfask_core::config_file::ServerConfig;

    #[test]
    fn defaults_when_section_missing() {
        let settings = ServerSettings::from_file(&ConfigFile::default());
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.max_upload_bytes(), 100 * 1024 * 1024);
        assert!(settings.static_dir.is_none());
        assert_eq!(settings.max_concurrent_extractions, 4);
    }

    #[test]
    fn zero_extraction_slots_falls_back_to_default() {
        let file = ConfigFile {
            server: Some(ServerConfig {
                max_concurrent_extractions: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(ServerSettings::from_file(&file).max_concurrent_extractions, 4);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let file = ConfigFile {
            server: Some(ServerConfig {
                port: Some(8080),
                static_dir: Some("frontend/build".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let settings = ServerSettings::from_file(&file);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.extraction_timeout(), Duration::from_secs(30));
        assert_eq!(settings.static_dir, Some(PathBuf::from("frontend/build")));
    }
}
