// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the loaded [`GatewayConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ADMIN_API_BASE_URL` | Base URL every request path is resolved against | Required |
//! | `ADMIN_API_KEY` | Value sent as `x-api-key` | Required |
//! | `ADMIN_STORAGE_SECRET` | Static secret for the session store cipher | Required |
//! | `ADMIN_STORAGE_PATH` | JSON file backing the session store | `./admin-session.json` |
//! | `ADMIN_REFRESH_WINDOW_SECS` | Proactive token refresh window | `300` |
//! | `ADMIN_REQUEST_TIMEOUT_SECS` | HTTP client timeout | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const BASE_URL_ENV: &str = "ADMIN_API_BASE_URL";
pub const API_KEY_ENV: &str = "ADMIN_API_KEY";

/// Secret for [`crate::storage::StorageCipher`].
///
/// Shipped with the client, so it obfuscates stored values; it does not make
/// them confidential.
pub const STORAGE_SECRET_ENV: &str = "ADMIN_STORAGE_SECRET";
pub const STORAGE_PATH_ENV: &str = "ADMIN_STORAGE_PATH";
pub const REFRESH_WINDOW_ENV: &str = "ADMIN_REFRESH_WINDOW_SECS";
pub const REQUEST_TIMEOUT_ENV: &str = "ADMIN_REQUEST_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_STORAGE_PATH: &str = "./admin-session.json";

/// A token expiring within this window is due for a proactive refresh.
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(300);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Route the app is sent to after a session teardown.
pub const ENTRY_ROUTE: &str = "/";

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub api_key: String,
    pub storage_secret: String,
    pub storage_path: PathBuf,
    pub refresh_window: Duration,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Configuration with defaults for everything but the three required values.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        storage_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            storage_secret: storage_secret.into(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            refresh_window: DEFAULT_REFRESH_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let raw_base_url = required(BASE_URL_ENV)?;
        let base_url = Url::parse(raw_base_url.trim()).map_err(|e| ConfigError::Invalid {
            name: BASE_URL_ENV,
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: BASE_URL_ENV,
                reason: format!("unsupported scheme `{}`", base_url.scheme()),
            });
        }

        let mut config = Self::new(
            base_url,
            required(API_KEY_ENV)?,
            required(STORAGE_SECRET_ENV)?,
        );

        if let Some(path) = var(STORAGE_PATH_ENV) {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(secs) = var(REFRESH_WINDOW_ENV) {
            config.refresh_window = parse_secs(REFRESH_WINDOW_ENV, &secs)?;
        }
        if let Some(secs) = var(REQUEST_TIMEOUT_ENV) {
            config.request_timeout = parse_secs(REQUEST_TIMEOUT_ENV, &secs)?;
        }

        Ok(config)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("storage_secret", &"<redacted>")
            .field("storage_path", &self.storage_path)
            .field("refresh_window", &self.refresh_window)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn parse_secs(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
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

    fn required_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            (BASE_URL_ENV, "https://api.example.com/v1"),
            (API_KEY_ENV, "key-123"),
            (STORAGE_SECRET_ENV, "s3cret"),
        ]
    }

    #[test]
    fn loads_required_values_with_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&required_vars())).unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.example.com/v1");
        assert_eq!(config.api_key, "key-123");
        assert_eq!(config.refresh_window, DEFAULT_REFRESH_WINDOW);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.storage_path, PathBuf::from(DEFAULT_STORAGE_PATH));
    }

    #[test]
    fn overrides_optional_values() {
        let mut vars = required_vars();
        vars.push((REFRESH_WINDOW_ENV, "60"));
        vars.push((REQUEST_TIMEOUT_ENV, "5"));
        vars.push((STORAGE_PATH_ENV, "/tmp/session.json"));

        let config = GatewayConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.refresh_window, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.storage_path, PathBuf::from("/tmp/session.json"));
    }

    #[test]
    fn missing_required_value_is_reported() {
        let vars: Vec<_> = required_vars()
            .into_iter()
            .filter(|(k, _)| *k != API_KEY_ENV)
            .collect();
        let err = GatewayConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_ENV)));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = required_vars();
        vars.retain(|(k, _)| *k != STORAGE_SECRET_ENV);
        vars.push((STORAGE_SECRET_ENV, "  "));
        let err = GatewayConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(STORAGE_SECRET_ENV)));
    }

    #[test]
    fn rejects_bad_base_url_and_numbers() {
        let mut vars = required_vars();
        vars[0] = (BASE_URL_ENV, "ftp://files.example.com");
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { .. })
        ));

        let mut vars = required_vars();
        vars.push((REFRESH_WINDOW_ENV, "five"));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: REFRESH_WINDOW_ENV, .. })
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = GatewayConfig::from_lookup(lookup(&required_vars())).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("key-123"));
        assert!(!rendered.contains("s3cret"));
    }
}
