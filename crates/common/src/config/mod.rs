//! Configuration management for the Past Papers services
//!
//! Supports loading configuration from:
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Environment variables (prefixed with APP__)
//! - The deployment variables PORT, API_URL and CONNECTION_STRING
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix the papers resource is mounted under
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection URL (postgres://... or sqlite:...)
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Create the (unit_code, year_taken) index as UNIQUE
    #[serde(default)]
    pub unique_composite_key: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of compact text
    #[serde(default)]
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_api_prefix() -> String { "/api/v1".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            metrics_port: 0,
        }
    }
}

impl ServerConfig {
    /// The API prefix with exactly one leading slash and no trailing slash.
    ///
    /// Returns an empty string when the resource is mounted at the root.
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(&self.api_prefix)
    }
}

/// Normalize a mount prefix: "api/v1/" -> "/api/v1", "/" -> ""
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

impl AppConfig {
    /// Load configuration from files, environment, and defaults
    pub fn load() -> Result<Self> {
        let config = Self::layered().map_err(configuration_error)?;

        let has_url = config
            .get_string("database.url")
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false);
        if !has_url {
            return Err(AppError::Configuration {
                message: "database.url is not set (use CONNECTION_STRING or APP__DATABASE__URL)"
                    .to_string(),
            });
        }

        config.try_deserialize().map_err(configuration_error)
    }

    fn layered() -> std::result::Result<Config, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Config::builder()
            // Start with defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("server.api_prefix", default_api_prefix())?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )

            // Plain deployment variables win over everything else
            .set_override_option("server.port", env_var("PORT"))?
            .set_override_option("server.api_prefix", env_var("API_URL"))?
            .set_override_option("database.url", env_var("CONNECTION_STRING"))?

            .build()
    }

    /// Configuration for an in-process store, used by tests and local runs
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                // every connection to sqlite::memory: is a separate database
                max_connections: 1,
                min_connections: 1,
                ..DatabaseConfig::default()
            },
            ..Self::default()
        }
    }
}

fn configuration_error(err: ConfigError) -> AppError {
    AppError::Configuration {
        message: err.to_string(),
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/pastpapers".to_string(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            unique_composite_key: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                api_prefix: default_api_prefix(),
            },
            database: DatabaseConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert!(!config.database.unique_composite_key);
        assert_eq!(config.observability.metrics_port, 0);
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(normalize_prefix("/api/v1"), "/api/v1");
        assert_eq!(normalize_prefix("api/v1/"), "/api/v1");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("  /v2  "), "/v2");
    }

    const LAYERED_VARS: [&str; 7] = [
        "PORT",
        "API_URL",
        "CONNECTION_STRING",
        "APP__SERVER__PORT",
        "APP__SERVER__HOST",
        "APP__DATABASE__URL",
        "APP__DATABASE__MAX_CONNECTIONS",
    ];

    fn clear_layered_vars() {
        for key in LAYERED_VARS {
            std::env::remove_var(key);
        }
    }

    // Process environment is shared, so every env-driven case lives in this one test
    #[test]
    fn test_load_layers_environment() {
        clear_layered_vars();

        let err = AppConfig::load().unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert!(err.to_string().contains("database.url is not set"));

        std::env::set_var("APP__DATABASE__URL", "sqlite::memory:");
        std::env::set_var("APP__DATABASE__MAX_CONNECTIONS", "3");
        std::env::set_var("APP__SERVER__HOST", "127.0.0.1");
        std::env::set_var("APP__SERVER__PORT", "8081");
        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 3);

        std::env::set_var("PORT", "9191");
        std::env::set_var("API_URL", "/api/v2");
        std::env::set_var("CONNECTION_STRING", "postgres://db/papers");
        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.server.normalized_prefix(), "/api/v2");
        assert_eq!(config.database.url, "postgres://db/papers");

        // blank deployment variables fall through to the layer below
        std::env::set_var("PORT", " ");
        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 8081);

        std::env::set_var("PORT", "not-a-port");
        let err = AppConfig::load().unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));

        clear_layered_vars();
    }

    #[test]
    fn test_in_memory_uses_single_connection() {
        let config = AppConfig::in_memory();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
        assert_eq!(config.server.normalized_prefix(), "/api/v1");
    }
}
