use std::env;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the content backend, without the `/api` suffix.
    pub base_url: String,
    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,
    /// Admin event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            api_token: None,
            event_bus_capacity: 1024,
            log_level: "info".to_string(),
        }
    }

    /// Load configuration from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (dev convenience)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("CMS_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("CMS_API_BASE_URL"))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "CMS_API_BASE_URL",
                value: base_url,
                reason: "expected an http or https URL".to_string(),
            });
        }

        let event_bus_capacity = match lookup("EVENT_BUS_CAPACITY") {
            None => 1024,
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::Invalid {
                        key: "EVENT_BUS_CAPACITY",
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    })
                }
                Ok(n) => n,
            },
        };

        Ok(Self {
            base_url: normalize_base_url(&base_url),
            api_token: lookup("CMS_API_TOKEN").filter(|v| !v.is_empty()),
            event_bus_capacity,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
