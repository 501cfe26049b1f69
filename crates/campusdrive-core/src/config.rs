//! Configuration module for CampusDrive.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation and defaults. The host shell may override
//! any of this programmatically; the settings store (`settings.json`) remains
//! the source of truth for user-editable values like the project directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for CampusDrive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Course-server API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the course server.
    pub base_url: String,
    /// Timeout in seconds for JSON requests.
    pub request_timeout: u64,
    /// Timeout in seconds for archive uploads, which can be large.
    pub upload_timeout: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Path to the log file.
    pub file: PathBuf,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/campusdrive/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("campusdrive")
            .join("config.yaml")
    }

    /// Platform-appropriate directory for persisted application data
    /// (`settings.json`, `project_metadata.json`, `privateKey.pem`).
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("campusdrive")
    }

    /// Validate field ranges; returns every problem found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.api.base_url.is_empty() {
            errors.push(ConfigError::new("api.base_url", "must not be empty"));
        }
        if self.api.request_timeout == 0 {
            errors.push(ConfigError::new("api.request_timeout", "must be positive"));
        }
        if self.api.upload_timeout < self.api.request_timeout {
            errors.push(ConfigError::new(
                "api.upload_timeout",
                "must be at least api.request_timeout",
            ));
        }
        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            errors.push(ConfigError::new(
                "logging.level",
                "must be one of trace, debug, info, warn, error",
            ));
        }

        errors
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.campusdrive.example".to_string(),
            request_timeout: 30,
            upload_timeout: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Config::default_data_dir().join("campusdrive.log"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.api.request_timeout, 30);
        assert_eq!(config.api.upload_timeout, 300);
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut config = Config::default();
        config.api.base_url.clear();
        config.api.upload_timeout = 1;
        config.logging.level = "loud".to_string();

        let errors = config.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"api.base_url"));
        assert!(fields.contains(&"api.upload_timeout"));
        assert!(fields.contains(&"logging.level"));
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = Config::default();
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.api.base_url, config.api.base_url);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert!(config.validate().is_empty());
    }
}
