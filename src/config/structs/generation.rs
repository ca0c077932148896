//! Generation parameter configuration structures.

use serde::{Deserialize, Serialize};

use crate::constants::llm;
use crate::error::{FitError, Result};

/// Generation configuration.
///
/// Sampling parameters and token budgets for model requests.
///
/// # Fields
/// - `max_tokens`: token budget for generic chat requests (default: `2000`)
/// - `workout_max_tokens`: token budget for workout generation (default: `3000`)
/// - `temperature`: sampling temperature in `0.0..=2.0` (default: `0.7`)
/// - `creative_temperature`: temperature used by the creative personality (default: `0.8`)
/// - `top_p`: nucleus sampling cutoff in `0.0..=1.0` (default: `0.9`)
///
/// # Example
/// ```toml
/// [generation]
/// workout_max_tokens = 3000
/// temperature = 0.7
/// top_p = 0.9
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Token budget for generic chat requests.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Token budget for workout generation requests.
    ///
    /// Workout responses carry a full JSON plan, so this is larger than
    /// `max_tokens`.
    #[serde(default = "default_workout_max_tokens")]
    pub workout_max_tokens: u32,

    /// Sampling temperature in `0.0..=2.0`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Temperature used by the creative personality.
    #[serde(default = "default_creative_temperature")]
    pub creative_temperature: f32,

    /// Nucleus sampling cutoff in `0.0..=1.0`.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            workout_max_tokens: default_workout_max_tokens(),
            temperature: default_temperature(),
            creative_temperature: default_creative_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl GenerationConfig {
    /// Validates generation configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, temp) in [
            ("generation.temperature", self.temperature),
            ("generation.creative_temperature", self.creative_temperature),
        ] {
            if !(0.0..=2.0).contains(&temp) {
                return Err(FitError::Config(format!(
                    "{} {} out of range [0.0, 2.0]",
                    name, temp
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(FitError::Config(format!(
                "generation.top_p {} out of range [0.0, 1.0]",
                self.top_p
            )));
        }
        if self.max_tokens == 0 || self.workout_max_tokens == 0 {
            return Err(FitError::Config(
                "generation token budgets cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_tokens() -> u32 {
    llm::DEFAULT_MAX_TOKENS
}

fn default_workout_max_tokens() -> u32 {
    llm::WORKOUT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    llm::DEFAULT_TEMPERATURE
}

fn default_creative_temperature() -> f32 {
    llm::CREATIVE_TEMPERATURE
}

fn default_top_p() -> f32 {
    llm::DEFAULT_TOP_P
}
