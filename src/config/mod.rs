//! Configuration management
//!
//! Configuration is loaded from a config.yml file with environment variable
//! overrides on top. Missing files, empty files, and missing keys all fall
//! back to sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Durable store configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Over-duration alert configuration
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// After-hours parking adjustments
    #[serde(default)]
    pub after_hours: AfterHoursConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8500
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Durable store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path (or full sqlite: URL)
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/parking.db".to_string()
}

/// Over-duration alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Threshold used by GET /alerts when no ?hours= is given
    #[serde(default = "default_alert_hours")]
    pub default_hours: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            default_hours: default_alert_hours(),
        }
    }
}

fn default_alert_hours() -> f64 {
    4.0
}

/// After-hours parking adjustments
///
/// The base after-hours set is the faculty (Blue) category lots; these lists
/// add and remove specific lot codes on top of that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AfterHoursConfig {
    /// Extra lot codes opened after hours
    #[serde(default)]
    pub extra_lots: Vec<String>,
    /// Lot codes closed after hours despite their category
    #[serde(default)]
    pub excluded_lots: Vec<String>,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// Environment variables follow the pattern:
    /// - STAGPARK_SERVER_HOST
    /// - STAGPARK_SERVER_PORT
    /// - STAGPARK_SERVER_CORS_ORIGIN
    /// - STAGPARK_DATABASE_URL
    /// - STAGPARK_ALERTS_DEFAULT_HOURS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("STAGPARK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("STAGPARK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("STAGPARK_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(url) = std::env::var("STAGPARK_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(hours) = std::env::var("STAGPARK_ALERTS_DEFAULT_HOURS") {
            if let Ok(hours) = hours.parse::<f64>() {
                self.alerts.default_hours = hours;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load(std::path::Path::new("nonexistent_config.yml")).unwrap();
        assert_eq!(config.server.port, 8500);
        assert_eq!(config.database.url, "data/parking.db");
        assert_eq!(config.alerts.default_hours, 4.0);
        assert!(config.after_hours.extra_lots.is_empty());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 9000\nafter_hours:\n  extra_lots: [\"N-1\"]\n  excluded_lots: [\"K-1\"]"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.after_hours.extra_lots, vec!["N-1".to_string()]);
        assert_eq!(config.after_hours.excluded_lots, vec!["K-1".to_string()]);
        assert_eq!(config.alerts.default_hours, 4.0);
    }

    #[test]
    fn test_load_invalid_yaml_fails_with_location() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: [not a port").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = lock_env();

        std::env::set_var("STAGPARK_SERVER_PORT", "9100");
        std::env::set_var("STAGPARK_DATABASE_URL", "/tmp/other.db");
        std::env::set_var("STAGPARK_ALERTS_DEFAULT_HOURS", "6.5");

        let config =
            Config::load_with_env(std::path::Path::new("nonexistent_config.yml")).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.database.url, "/tmp/other.db");
        assert_eq!(config.alerts.default_hours, 6.5);

        std::env::remove_var("STAGPARK_SERVER_PORT");
        std::env::remove_var("STAGPARK_DATABASE_URL");
        std::env::remove_var("STAGPARK_ALERTS_DEFAULT_HOURS");
    }

    #[test]
    fn test_env_override_invalid_port_ignored() {
        let _guard = lock_env();

        std::env::set_var("STAGPARK_SERVER_PORT", "not-a-port");
        let config =
            Config::load_with_env(std::path::Path::new("nonexistent_config.yml")).unwrap();
        assert_eq!(config.server.port, 8500);
        std::env::remove_var("STAGPARK_SERVER_PORT");
    }
}
