//! Top-level application configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::generation::GenerationConfig;
use super::network::NetworkConfig;

/// Application configuration.
///
/// Top-level runtime configuration for `fittrack-rs`.
///
/// Effective configuration is merged from multiple sources (low to high):
/// 1. Rust defaults (`Default` + `serde(default)`)
/// 2. User-level config file (platform-specific config directory)
/// 3. `FITTRACK__*` environment variables
///
/// The OpenRouter API key is deliberately not part of this configuration;
/// it lives in the settings store.
///
/// # Configuration File Locations
/// - Linux: `~/.config/fittrack/config.toml`
/// - macOS: `~/Library/Application Support/fittrack/config.toml`
/// - Windows: `%APPDATA%\fittrack\config\config.toml`
///
/// # Example
/// ```toml
/// [app]
/// site_url = "https://fittrack.example.com"
/// language = "de"
///
/// [network]
/// request_timeout = 60
/// max_attempts = 3
///
/// [generation]
/// temperature = 0.7
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Application identity and locale settings.
    #[serde(default)]
    pub app: AppSettings,

    /// HTTP timeout and retry settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Sampling parameters and token budgets.
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl AppConfig {
    /// Validates configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.generation.validate()?;
        Ok(())
    }
}

/// Application identity settings.
///
/// `site_url` and `title` are sent to OpenRouter as the `HTTP-Referer`
/// and `X-Title` attribution headers.
///
/// # Example
/// ```toml
/// [app]
/// site_url = "http://localhost:3000"
/// title = "FitTrack - AI Fitness Assistant"
/// language = "de"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppSettings {
    /// Referer URL reported to OpenRouter.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Application title reported to OpenRouter.
    #[serde(default = "default_title")]
    pub title: String,

    /// Locale for user-facing messages (for example `"en"`, `"de"`).
    /// `None` means auto-detect from the system locale.
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            title: default_title(),
            language: None,
        }
    }
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_title() -> String {
    "FitTrack - AI Fitness Assistant".to_string()
}
