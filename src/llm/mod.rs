//! AI 训练生成管线：提示词、模型目录、OpenRouter 传输、响应解析与编排
//!
//! Data flows one direction: a [`GenerationRequest`] becomes a prompt pair,
//! goes through a [`ChatProvider`] to the model, and the raw completion is
//! parsed and normalized into an [`EnhancedWorkoutResponse`].

use std::time::Duration;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::constants::api;
use crate::error::Result;
use crate::profile::UserProfile;
use crate::safety::SafetyAnalysis;
use crate::workout::{GeneratedWorkout, SessionParameters};

pub mod catalog;
pub mod generator;
pub mod openrouter;
pub mod prompt;
pub mod response;
pub mod retry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use catalog::{default_model, models_for, select_model, AiModel, ModelType};
pub use generator::WorkoutGenerator;
pub use openrouter::{ModelSummary, OpenRouterClient};
pub use response::parse_workout_response;

/// 消息角色，序列化为 OpenRouter 线上格式的小写名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Single message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// 创建 system 消息
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// 创建 user 消息
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Per-call knobs for a chat completion.
///
/// 数值默认取自配置层，调用方按场景覆盖（例如训练生成用更大的
/// max_tokens，创意人格用更高的 temperature，编排层再写入目录
/// 选出的模型 id）。
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Model id sent in the request body.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Total attempt budget, including the first call.
    pub max_attempts: u32,
}

impl ChatOptions {
    /// Generic defaults from the configuration layer.
    ///
    /// The model starts as the cheap probe model; callers routing through
    /// the catalog overwrite it per request.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: api::PROBE_MODEL.to_string(),
            max_tokens: config.generation.max_tokens,
            temperature: config.generation.temperature,
            top_p: config.generation.top_p,
            timeout: Duration::from_secs(config.network.request_timeout),
            max_attempts: config.network.max_attempts as u32,
        }
    }
}

/// Token accounting reported by the API.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Flattened result of one successful chat completion.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Content of the first choice; empty when the API returned none.
    pub content: String,
    /// Model id the API reports having served the request.
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Chat completion seam between the orchestrator and the HTTP transport.
///
/// # Architecture
///
/// [`WorkoutGenerator`] depends on this trait instead of on
/// [`OpenRouterClient`] directly, so tests can substitute a mock and callers
/// can plug in any OpenAI-compatible backend.
///
/// Implementations own their retry policy: a returned error is final as far
/// as the orchestrator is concerned.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use fittrack_rs::llm::{ChatMessage, ChatOptions, ChatOutcome, ChatProvider};
/// use fittrack_rs::Result;
///
/// struct CannedProvider;
///
/// #[async_trait]
/// impl ChatProvider for CannedProvider {
///     async fn chat_completion(
///         &self,
///         _messages: &[ChatMessage],
///         _options: &ChatOptions,
///     ) -> Result<ChatOutcome> {
///         Ok(ChatOutcome {
///             content: r#"{"workout": {"title": "Canned"}}"#.to_string(),
///             model: "canned/model".to_string(),
///             usage: None,
///         })
///     }
/// }
/// ```
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends one logical chat completion, retrying internally as configured.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatOutcome>;
}

/// Free-text refinements layered on top of the session parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPreferences {
    /// Broad emphasis such as "strength", "cardio", "flexibility" or "mixed".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_instructions: Option<String>,
}

/// Complete input for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub user_profile: UserProfile,
    pub session: SessionParameters,
    #[serde(default)]
    pub preferences: GenerationPreferences,
}

impl GenerationRequest {
    /// Validates the session parameters before any prompt is built.
    pub fn validate(&self) -> Result<()> {
        self.session.validate()
    }
}

fn default_target_intensity() -> u8 {
    7
}

fn default_progression_notes() -> Vec<String> {
    vec!["Start conservatively and adjust based on how you feel".to_string()]
}

fn default_recovery_recommendations() -> Vec<String> {
    vec!["Take adequate rest between sessions".to_string()]
}

/// RPE coaching guidance attached to a generated workout.
///
/// 模型漏掉该段时退回固定的保守默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpeGuidance {
    #[serde(default = "default_target_intensity")]
    pub target_intensity: u8,
    #[serde(default = "default_progression_notes")]
    pub progression_notes: Vec<String>,
    #[serde(default = "default_recovery_recommendations")]
    pub recovery_recommendations: Vec<String>,
}

impl Default for RpeGuidance {
    fn default() -> Self {
        Self {
            target_intensity: default_target_intensity(),
            progression_notes: default_progression_notes(),
            recovery_recommendations: default_recovery_recommendations(),
        }
    }
}

/// Envelope handed back to the caller after a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedWorkoutResponse {
    pub workout: GeneratedWorkout,
    #[serde(default)]
    pub personalized_message: String,
    #[serde(default)]
    pub model_used: String,
    #[serde(default)]
    pub rpe_guidance: RpeGuidance,
    #[serde(default)]
    pub safety_analysis: SafetyAnalysis,
}
