//! Configuration module for Post Box.

use serde::Deserialize;
use std::path::Path;

use crate::{PostboxError, Result};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Rate limit for API endpoints (requests per minute per IP).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_rate_limit() -> u32 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            api_rate_limit: default_api_rate_limit(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/postbox.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Default language code (en / fa).
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/postbox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Content moderation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// API key for the classifier. Empty disables moderation.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the classifier API.
    #[serde(default = "default_moderation_endpoint")]
    pub endpoint: String,
    /// Model name.
    #[serde(default = "default_moderation_model")]
    pub model: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_moderation_timeout")]
    pub timeout_secs: u64,
}

fn default_moderation_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_moderation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_moderation_timeout() -> u64 {
    10
}

impl ModerationConfig {
    /// Whether a credential is configured.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_moderation_endpoint(),
            model: default_moderation_model(),
            timeout_secs: default_moderation_timeout(),
        }
    }
}

/// Letter delivery rules.
#[derive(Debug, Clone, Deserialize)]
pub struct PostboxConfig {
    /// Minimum hours between two sends on the same channel.
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: u32,
    /// Maximum letter length in characters.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

fn default_cooldown_hours() -> u32 {
    24
}

fn default_max_content_length() -> usize {
    crate::letter::MAX_CONTENT_LENGTH
}

impl Default for PostboxConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: default_cooldown_hours(),
            max_content_length: default_max_content_length(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Locale configuration.
    #[serde(default)]
    pub locale: LocaleConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Moderation configuration.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Delivery rules.
    #[serde(default)]
    pub postbox: PostboxConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PostboxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PostboxError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `POSTBOX_MODERATION_API_KEY`: moderation API key
    /// - `API_KEY`: moderation API key, used when the above is unset
    pub fn apply_env_overrides(&mut self) {
        let key = std::env::var("POSTBOX_MODERATION_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("API_KEY").ok().filter(|k| !k.is_empty()));
        if let Some(key) = key {
            self.moderation.api_key = key;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.postbox.cooldown_hours == 0 {
            return Err(PostboxError::Config(
                "postbox.cooldown_hours must be at least 1".to_string(),
            ));
        }
        if self.postbox.max_content_length == 0 {
            return Err(PostboxError::Config(
                "postbox.max_content_length must be at least 1".to_string(),
            ));
        }
        if self.moderation.timeout_secs == 0 {
            return Err(PostboxError::Config(
                "moderation.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.moderation.is_enabled() {
            url::Url::parse(&self.moderation.endpoint).map_err(|e| {
                PostboxError::Config(format!("invalid moderation endpoint: {e}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.server.api_rate_limit, 120);

        assert_eq!(config.database.path, "data/postbox.db");
        assert_eq!(config.locale.language, "en");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/postbox.log");

        assert!(!config.moderation.is_enabled());
        assert_eq!(config.moderation.model, "gemini-2.5-flash");
        assert_eq!(config.moderation.timeout_secs, 10);

        assert_eq!(config.postbox.cooldown_hours, 24);
        assert_eq!(config.postbox.max_content_length, 500);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.postbox.cooldown_hours, 24);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:5173"]
api_rate_limit = 30

[database]
path = "custom/postbox.sqlite"

[locale]
language = "fa"

[logging]
level = "debug"
file = "custom/logs/app.log"

[moderation]
api_key = "secret"
endpoint = "http://localhost:9999"
model = "gemini-test"
timeout_secs = 3

[postbox]
cooldown_hours = 12
max_content_length = 280
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.server.api_rate_limit, 30);
        assert_eq!(config.database.path, "custom/postbox.sqlite");
        assert_eq!(config.locale.language, "fa");
        assert_eq!(config.logging.level, "debug");
        assert!(config.moderation.is_enabled());
        assert_eq!(config.moderation.endpoint, "http://localhost:9999");
        assert_eq!(config.moderation.model, "gemini-test");
        assert_eq!(config.moderation.timeout_secs, 3);
        assert_eq!(config.postbox.cooldown_hours, 12);
        assert_eq!(config.postbox.max_content_length, 280);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[server\nport = ");
        assert!(matches!(result, Err(PostboxError::Config(_))));
    }

    #[test]
    fn test_validate_zero_cooldown() {
        let mut config = Config::default();
        config.postbox.cooldown_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.moderation.api_key = "key".to_string();
        config.moderation.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_whitespace_api_key_is_disabled() {
        let mut config = Config::default();
        config.moderation.api_key = "   ".to_string();
        assert!(!config.moderation.is_enabled());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/postbox.toml");
        assert!(matches!(result, Err(PostboxError::Io(_))));
    }
}
