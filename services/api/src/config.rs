//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use job_board_core::feed::DEFAULT_PAGE_SIZE;
use job_board_core::ColorScheme;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where bookmarks live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    /// A JSON document under the data directory.
    File,
    /// Process memory only; bookmarks vanish on exit.
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            other => Err(format!("'{}' is not a storage kind, expected 'file' or 'memory'", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub feed_url: String,
    pub page_size: usize,
    pub feed_timeout: Duration,
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub system_color_scheme: ColorScheme,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = parse_var(&lookup, "BIND_ADDRESS", "127.0.0.1:3000")?;

        let feed_url = lookup("FEED_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("FEED_URL".to_string()))?;

        let page_size: usize = parse_var(&lookup, "FEED_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "FEED_PAGE_SIZE".to_string(),
                "page size must be at least 1".to_string(),
            ));
        }

        let timeout_secs: u64 = parse_var(&lookup, "FEED_TIMEOUT_SECS", "15")?;

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let storage = parse_var(&lookup, "STORAGE", "file")?;
        let system_color_scheme = parse_var(&lookup, "SYSTEM_COLOR_SCHEME", "light")?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            feed_url,
            page_size,
            feed_timeout: Duration::from_secs(timeout_secs),
            data_dir,
            storage,
            system_color_scheme,
            log_level,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_feed_url_is_set() {
        let config = Config::from_lookup(lookup(&[("FEED_URL", "https://jobs.example/api")])).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.feed_timeout, Duration::from_secs(15));
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.system_color_scheme, ColorScheme::Light);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn missing_feed_url_is_reported() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "FEED_URL"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[
            ("FEED_URL", "https://jobs.example/api"),
            ("SYSTEM_COLOR_SCHEME", "sepia"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "SYSTEM_COLOR_SCHEME"));

        let err = Config::from_lookup(lookup(&[
            ("FEED_URL", "https://jobs.example/api"),
            ("FEED_PAGE_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "FEED_PAGE_SIZE"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("FEED_URL", "https://jobs.example/api"),
            ("FEED_PAGE_SIZE", "25"),
            ("STORAGE", "memory"),
            ("SYSTEM_COLOR_SCHEME", "dark"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.system_color_scheme, ColorScheme::Dark);
        assert_eq!(config.log_level, Level::DEBUG);
    }
}
