//! Network and HTTP configuration structures.

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Network configuration.
///
/// Controls timeout and retry behavior for OpenRouter requests.
///
/// # Fields
/// - `request_timeout`: chat completion timeout in seconds (default: `60`)
/// - `connect_timeout`: HTTP connect timeout in seconds (default: `10`)
/// - `models_timeout`: model listing timeout in seconds (default: `15`)
/// - `probe_timeout`: connection test timeout in seconds (default: `10`)
/// - `max_attempts`: total attempts per request, including the first (default: `3`)
/// - `max_retry_delay_ms`: cap applied to retry delays in milliseconds (default: `60000`)
///
/// # Example
/// ```toml
/// [network]
/// request_timeout = 60
/// connect_timeout = 10
/// max_attempts = 3
/// max_retry_delay_ms = 60000
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Chat completion timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// HTTP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Model listing timeout in seconds.
    #[serde(default = "default_models_timeout")]
    pub models_timeout: u64,

    /// Connection test timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,

    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Cap applied to retry delays in milliseconds.
    ///
    /// Also bounds `Retry-After` values taken from rate limit responses.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            models_timeout: default_models_timeout(),
            probe_timeout: default_probe_timeout(),
            max_attempts: default_max_attempts(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

impl NetworkConfig {
    /// Validates network configuration.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout == 0 {
            return Err(FitError::Config(
                "network.request_timeout cannot be 0".into(),
            ));
        }
        if self.connect_timeout == 0 {
            return Err(FitError::Config(
                "network.connect_timeout cannot be 0".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(FitError::Config("network.max_attempts cannot be 0".into()));
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_models_timeout() -> u64 {
    15
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_max_attempts() -> usize {
    3
}

fn default_max_retry_delay_ms() -> u64 {
    60_000 // 60 seconds
}
