//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Secret shipped in the defaults; only fit for local development
pub const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";

/// Shortest token lifetime accepted from configuration
const MIN_TOKEN_TTL_HOURS: u64 = 1;

/// Longest token lifetime accepted from configuration (one week)
const MAX_TOKEN_TTL_HOURS: u64 = 168;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Lifetime of issued tokens
    ///
    /// Valid range: 1-168 hours. Default: 24 hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    /// Argon2 time cost (iterations)
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    /// Argon2 memory cost in KiB
    #[serde(default = "default_password_memory_kib")]
    pub password_memory_kib: u32,
}

impl AuthConfig {
    /// Token lifetime clamped to [1, 168] hours, logging a warning if adjusted
    pub fn validated_ttl_hours(&self) -> u64 {
        if self.token_ttl_hours < MIN_TOKEN_TTL_HOURS {
            warn!(
                "token_ttl_hours {} is below minimum {}, using minimum",
                self.token_ttl_hours, MIN_TOKEN_TTL_HOURS
            );
            MIN_TOKEN_TTL_HOURS
        } else if self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            warn!(
                "token_ttl_hours {} exceeds maximum {}, using maximum",
                self.token_ttl_hours, MAX_TOKEN_TTL_HOURS
            );
            MAX_TOKEN_TTL_HOURS
        } else {
            self.token_ttl_hours
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            password_cost: default_password_cost(),
            password_memory_kib: default_password_memory_kib(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/tasklist.db".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_password_cost() -> u32 {
    tasklist_auth::password::DEFAULT_TIME_COST
}

fn default_password_memory_kib() -> u32 {
    tasklist_auth::password::DEFAULT_MEMORY_KIB
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file was missing
    Defaults,
}

impl Config {
    /// Load configuration from a file, falling back to defaults when it is missing.
    ///
    /// Nothing is logged here since this runs before the subscriber exists.
    pub fn load(path: &str) -> Result<(Self, ConfigSource)> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults));
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok((config, ConfigSource::File))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let (config, source) = Config::load("/nonexistent/tasklist.toml").unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "./data/tasklist.db");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(config.auth.uses_default_secret());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[auth]\njwt_secret = \"s3cret\"\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let (config, source) = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert!(!config.auth.uses_default_secret());
        assert_eq!(config.auth.password_cost, 2);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_ttl_clamped() {
        let mut auth = AuthConfig::default();
        assert_eq!(auth.validated_ttl_hours(), 24);

        auth.token_ttl_hours = 0;
        assert_eq!(auth.validated_ttl_hours(), 1);

        auth.token_ttl_hours = 1000;
        assert_eq!(auth.validated_ttl_hours(), 168);
    }
}
