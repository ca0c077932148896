//! Static model catalog and model-type selection.
//!
//! Each [`ModelType`] maps to an ordered candidate list; the first entry is
//! the default for that type. The capable free DeepSeek model leads every
//! list so users without credits still get workouts.

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Model tier requested by the caller.
///
/// Maps a product-level quality/speed trade-off onto a concrete model list.
///
/// # Variants
/// - [`Fast`] - quick and cheap, for simple workouts
/// - [`Precise`] - detailed planning with safety analysis
/// - [`Creative`] - varied, motivational workout concepts
/// - [`Custom`] - user-defined parameters on the free default model
///
/// [`Fast`]: ModelType::Fast
/// [`Precise`]: ModelType::Precise
/// [`Creative`]: ModelType::Creative
/// [`Custom`]: ModelType::Custom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Quick responses for simple workouts.
    Fast,
    /// Detailed planning with safety analysis.
    #[default]
    Precise,
    /// Varied, motivational workout concepts.
    Creative,
    /// User-defined configuration.
    Custom,
}

impl ModelType {
    /// Wire/config token for this model type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Precise => "precise",
            Self::Creative => "creative",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog entry describing a selectable OpenRouter model.
///
/// # Fields
/// - `id`: OpenRouter model id (`provider/model` form)
/// - `name`: human-readable model name
/// - `description`: short marketing-style description
/// - `model_type`: tier this entry belongs to
/// - `provider`: upstream vendor name
/// - `max_tokens`: completion budget the entry is rated for
/// - `cost_per_1k_tokens`: USD per 1k tokens (0.0 for free models)
/// - `capabilities`: coarse capability tags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiModel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub model_type: ModelType,
    pub provider: &'static str,
    pub max_tokens: u32,
    pub cost_per_1k_tokens: f64,
    pub capabilities: &'static [&'static str],
}

static FAST_MODELS: &[AiModel] = &[
    AiModel {
        id: "deepseek/deepseek-chat-v3.1:free",
        name: "DeepSeek Chat v3.1 (Free)",
        description: "Free, fast AI for efficient workouts",
        model_type: ModelType::Fast,
        provider: "DeepSeek",
        max_tokens: 4096,
        cost_per_1k_tokens: 0.0,
        capabilities: &["fast_response", "basic_workouts", "science_based"],
    },
    AiModel {
        id: "anthropic/claude-3-haiku",
        name: "Claude 3 Haiku",
        description: "Fast responses for simple workouts",
        model_type: ModelType::Fast,
        provider: "Anthropic",
        max_tokens: 4096,
        cost_per_1k_tokens: 0.25,
        capabilities: &["fast_response", "basic_workouts"],
    },
    AiModel {
        id: "openai/gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        description: "Proven fast AI for basic workouts",
        model_type: ModelType::Fast,
        provider: "OpenAI",
        max_tokens: 4096,
        cost_per_1k_tokens: 0.5,
        capabilities: &["fast_response", "basic_workouts"],
    },
];

static PRECISE_MODELS: &[AiModel] = &[
    AiModel {
        id: "deepseek/deepseek-chat-v3.1:free",
        name: "DeepSeek Chat v3.1 (Free)",
        description: "Free, science-based workout planning",
        model_type: ModelType::Precise,
        provider: "DeepSeek",
        max_tokens: 8192,
        cost_per_1k_tokens: 0.0,
        capabilities: &[
            "detailed_planning",
            "safety_analysis",
            "form_corrections",
            "science_based",
        ],
    },
    AiModel {
        id: "anthropic/claude-3-sonnet",
        name: "Claude 3 Sonnet",
        description: "Precise workout planning with detailed instructions",
        model_type: ModelType::Precise,
        provider: "Anthropic",
        max_tokens: 8192,
        cost_per_1k_tokens: 3.0,
        capabilities: &["detailed_planning", "safety_analysis", "form_corrections"],
    },
    AiModel {
        id: "openai/gpt-4-turbo",
        name: "GPT-4 Turbo",
        description: "High-precision workout creation with a safety focus",
        model_type: ModelType::Precise,
        provider: "OpenAI",
        max_tokens: 8192,
        cost_per_1k_tokens: 10.0,
        capabilities: &["detailed_planning", "safety_analysis", "form_corrections"],
    },
];

static CREATIVE_MODELS: &[AiModel] = &[
    AiModel {
        id: "deepseek/deepseek-chat-v3.1:free",
        name: "DeepSeek Chat v3.1 (Free)",
        description: "Free, creative and science-based workouts",
        model_type: ModelType::Creative,
        provider: "DeepSeek",
        max_tokens: 8192,
        cost_per_1k_tokens: 0.0,
        capabilities: &[
            "creative_workouts",
            "motivational_content",
            "personalized_humor",
            "science_based",
        ],
    },
    AiModel {
        id: "anthropic/claude-3-opus",
        name: "Claude 3 Opus",
        description: "Creative and motivating workout experiences",
        model_type: ModelType::Creative,
        provider: "Anthropic",
        max_tokens: 8192,
        cost_per_1k_tokens: 15.0,
        capabilities: &["creative_workouts", "motivational_content", "personalized_humor"],
    },
    AiModel {
        id: "openai/gpt-4",
        name: "GPT-4",
        description: "Innovative workout concepts with a personal touch",
        model_type: ModelType::Creative,
        provider: "OpenAI",
        max_tokens: 8192,
        cost_per_1k_tokens: 30.0,
        capabilities: &["creative_workouts", "motivational_content", "personalized_humor"],
    },
];

static CUSTOM_MODELS: &[AiModel] = &[AiModel {
    id: "deepseek/deepseek-chat-v3.1:free",
    name: "DeepSeek Chat v3.1 (Free)",
    description: "Custom configuration for science-based workouts",
    model_type: ModelType::Custom,
    provider: "DeepSeek",
    max_tokens: 8192,
    cost_per_1k_tokens: 0.0,
    capabilities: &["custom_configuration", "science_based", "flexible_parameters"],
}];

/// Returns the ordered candidate list for a model type.
pub fn models_for(model_type: ModelType) -> &'static [AiModel] {
    match model_type {
        ModelType::Fast => FAST_MODELS,
        ModelType::Precise => PRECISE_MODELS,
        ModelType::Creative => CREATIVE_MODELS,
        ModelType::Custom => CUSTOM_MODELS,
    }
}

/// 该档位的默认模型（候选列表首项）
pub fn default_model(model_type: ModelType) -> &'static AiModel {
    &models_for(model_type)[0]
}

/// Picks the model to use for a request: the first catalog entry of the type.
///
/// # Errors
/// Returns [`FitError::Config`] if the type has no registered models.
pub fn select_model(model_type: ModelType) -> Result<&'static AiModel> {
    models_for(model_type).first().ok_or_else(|| {
        FitError::Config(
            rust_i18n::t!("catalog.no_models", model_type = model_type.as_str()).to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_type_has_models() {
        for model_type in [
            ModelType::Fast,
            ModelType::Precise,
            ModelType::Creative,
            ModelType::Custom,
        ] {
            assert!(
                !models_for(model_type).is_empty(),
                "{model_type} has no models"
            );
            assert_eq!(default_model(model_type).id, models_for(model_type)[0].id);
        }
    }

    #[test]
    fn test_free_model_leads_every_type() {
        for model_type in [
            ModelType::Fast,
            ModelType::Precise,
            ModelType::Creative,
            ModelType::Custom,
        ] {
            let selected = select_model(model_type).unwrap();
            assert_eq!(selected.id, "deepseek/deepseek-chat-v3.1:free");
            assert_eq!(selected.cost_per_1k_tokens, 0.0);
            assert_eq!(selected.model_type, model_type);
        }
    }

    #[test]
    fn test_fast_tier_token_budget() {
        // Fast 档位的 completion 预算比其他档位小
        assert!(FAST_MODELS.iter().all(|m| m.max_tokens == 4096));
        assert!(PRECISE_MODELS.iter().all(|m| m.max_tokens == 8192));
        assert!(CREATIVE_MODELS.iter().all(|m| m.max_tokens == 8192));
    }

    #[test]
    fn test_paid_alternatives_present() {
        let ids: Vec<&str> = models_for(ModelType::Precise).iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                "deepseek/deepseek-chat-v3.1:free",
                "anthropic/claude-3-sonnet",
                "openai/gpt-4-turbo"
            ]
        );

        let ids: Vec<&str> = models_for(ModelType::Creative).iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                "deepseek/deepseek-chat-v3.1:free",
                "anthropic/claude-3-opus",
                "openai/gpt-4"
            ]
        );
    }

    #[test]
    fn test_custom_type_is_free_only() {
        let models = models_for(ModelType::Custom);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].cost_per_1k_tokens, 0.0);
    }

    #[test]
    fn test_model_type_wire_tokens() {
        assert_eq!(
            serde_json::to_string(&ModelType::Precise).unwrap(),
            "\"precise\""
        );
        let parsed: ModelType = serde_json::from_str("\"creative\"").unwrap();
        assert_eq!(parsed, ModelType::Creative);
        assert_eq!(ModelType::default(), ModelType::Precise);
    }

    #[test]
    fn test_model_type_rejects_unknown_token() {
        let result = serde_json::from_str::<ModelType>("\"turbo\"");
        assert!(result.is_err());
    }
}
