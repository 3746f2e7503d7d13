//! Application settings loaded from `config.toml`.
//!
//! Every field has a default, so running without a config file gives a working
//! local setup. Environment variables (usually from `.env`) take precedence:
//! `CONFIG_PATH` picks the file, `DATABASE_URL` and `BIND_ADDRESS` override
//! the values read from it.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server listens on
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://attendance_system.sqlite?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Password given to the `admin` account when it is first seeded
    pub default_admin_password: String,
    /// How long a login stays valid
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_admin_password: "admin123".to_string(),
            session_ttl_hours: 12,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads the configuration the binary runs with.
///
/// A missing config file falls back to defaults; a file that exists but does not
/// parse is an error. Environment overrides are applied last.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if Path::new(&path).exists() {
        info!("Loading configuration from {}", path);
        load_config(&path)?
    } else {
        warn!("{} not found, using default configuration", path);
        AppConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.server.bind_address = addr;
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.auth.session_ttl_hours <= 0 {
        return Err(Error::Config {
            message: "auth.session_ttl_hours must be positive".to_string(),
        });
    }
    if config.auth.default_admin_password.is_empty() {
        return Err(Error::Config {
            message: "auth.default_admin_password cannot be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind_address = "0.0.0.0:8080"

            [database]
            url = "sqlite://school.sqlite?mode=rwc"

            [auth]
            default_admin_password = "changeme"
            session_ttl_hours = 4
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database.url, "sqlite://school.sqlite?mode=rwc");
        assert_eq!(config.auth.default_admin_password, "changeme");
        assert_eq!(config.auth.session_ttl_hours, 4);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("[auth]\nsession_ttl_hours = 1\n").unwrap();
        assert_eq!(config.auth.session_ttl_hours, 1);
        assert_eq!(config.auth.default_admin_password, "admin123");
        assert_eq!(config.server.bind_address, "127.0.0.1:5000");
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            _ => None,
        });
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.bind_address, "127.0.0.1:5000");
    }

    #[test]
    fn test_validate_rejects_non_positive_ttl() {
        let mut config = AppConfig::default();
        config.auth.session_ttl_hours = 0;
        assert!(matches!(validate(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file_is_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
