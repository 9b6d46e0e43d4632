//! Application-level configuration loading, including the song catalog endpoint.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LISTEN_PARTY_BACK_CONFIG_PATH";
/// Catalog endpoint used when no configuration file is present.
const DEFAULT_CATALOG_BASE_URL: &str = "http://localhost:8081";
/// Per-request catalog timeout used when the file omits one.
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Base URL of the song catalog service.
    pub catalog_base_url: String,
    /// Timeout applied to each catalog HTTP request.
    pub catalog_timeout: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        catalog = %config.catalog_base_url,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.into(),
            catalog_timeout: Duration::from_secs(DEFAULT_CATALOG_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    catalog_base_url: Option<String>,
    catalog_timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            catalog_base_url: value.catalog_base_url.unwrap_or(defaults.catalog_base_url),
            catalog_timeout: value
                .catalog_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.catalog_timeout),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_fills_missing_fields_with_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.catalog_base_url, DEFAULT_CATALOG_BASE_URL);
        assert_eq!(
            config.catalog_timeout,
            Duration::from_secs(DEFAULT_CATALOG_TIMEOUT_SECS)
        );
    }

    #[test]
    fn raw_config_honours_explicit_values() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"catalog_base_url": "http://catalog:9000/", "catalog_timeout_secs": 2}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.catalog_base_url, "http://catalog:9000/");
        assert_eq!(config.catalog_timeout, Duration::from_secs(2));
    }
}
