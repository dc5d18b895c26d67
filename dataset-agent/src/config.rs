//! Agent settings.
//!
//! Loaded from a TOML file; every field has a default, so a partial file (or
//! no file at all) works.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::errors::ManagerError;
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Base directory for cached payloads
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_base_dir() -> PathBuf {
    PathBuf::from(".cache")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("dataset-agent/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content)
            .map_err(|e| ManagerError::Config(format!("invalid settings file: {e}")))?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_when_empty() {
        let settings = Settings::default();
        assert_eq!(settings.cache.base_dir, PathBuf::from(".cache"));
        assert_eq!(settings.http.timeout_secs, 30);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[http]").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.http.timeout_secs, 5);
        assert!(settings.http.user_agent.starts_with("dataset-agent/"));
        assert_eq!(settings.cache.base_dir, PathBuf::from(".cache"));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml = [").unwrap();

        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ManagerError::Config(_)));
    }
}
