//! 训练生成编排器：安全检查 → 提示词 → 模型选择 → 传输 → 解析 → 安全覆盖
//!
//! [`WorkoutGenerator`] drives the full pipeline for one request. The model
//! may propose its own safety analysis, but the locally computed one always
//! wins.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{classify_error, FitError, Result};
use crate::llm::catalog::{select_model, ModelType};
use crate::llm::prompt::{build_system_prompt, build_user_prompt};
use crate::llm::response::parse_workout_response;
use crate::llm::{
    ChatMessage, ChatOptions, ChatProvider, EnhancedWorkoutResponse, GenerationPreferences,
    GenerationRequest,
};
use crate::profile::UserProfile;
use crate::safety::{self, SafetyAnalysis};
use crate::workout::{equipment_for_category, MuscleGroup, SessionParameters, WorkoutMode};

/// Orchestrates one workout generation end to end.
///
/// 通过 [`ChatProvider`] 注入传输实现，配置在构造时固定。
pub struct WorkoutGenerator {
    provider: Arc<dyn ChatProvider>,
    config: AppConfig,
}

impl WorkoutGenerator {
    pub fn new(provider: Arc<dyn ChatProvider>, config: AppConfig) -> Self {
        Self { provider, config }
    }

    /// Generates a workout for an explicit request and model tier.
    ///
    /// Errors leave classified: transport failures already are, and anything
    /// else is classified here before it propagates.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        model_type: ModelType,
    ) -> Result<EnhancedWorkoutResponse> {
        match self.run(request, model_type).await {
            Ok(response) => Ok(response),
            Err(err @ FitError::Ai(_)) => Err(err),
            Err(other) => {
                let classified = classify_error(
                    &other,
                    vec![
                        ("operation".to_string(), "generate_workout".to_string()),
                        ("model_type".to_string(), model_type.as_str().to_string()),
                    ],
                );
                classified.log();
                Err(classified.into())
            }
        }
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        model_type: ModelType,
    ) -> Result<EnhancedWorkoutResponse> {
        // 安全检查先于一切，包括参数校验失败的场景
        let safety = safety::analyze(&request.session, &request.user_profile);
        if !safety.contraindications.is_empty() {
            tracing::warn!(
                count = safety.contraindications.len(),
                risk = %safety.risk_level,
                "safety warnings for this session"
            );
        }

        let system_prompt = build_system_prompt(model_type, request.session.mode);
        let user_prompt = build_user_prompt(request)?;
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];

        let model = select_model(model_type)?;
        let mut options = ChatOptions::from_config(&self.config);
        options.model = model.id.to_string();
        options.max_tokens = self.config.generation.workout_max_tokens;
        if model_type == ModelType::Creative {
            options.temperature = self.config.generation.creative_temperature;
        }

        tracing::info!(
            model = model.id,
            model_type = model_type.as_str(),
            mode = request.session.mode.as_str(),
            "generating workout"
        );

        let outcome = self.provider.chat_completion(&messages, &options).await?;
        if let Some(usage) = outcome.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "token usage"
            );
        }

        let mut response = parse_workout_response(&outcome.content, &outcome.model)?;

        // 本地安全分析覆盖模型给出的版本，警告同时并入 workout
        if !safety.contraindications.is_empty() {
            response
                .workout
                .warnings
                .extend(safety.contraindications.iter().cloned());
        }
        response.safety_analysis = safety;

        tracing::info!(
            title = %response.workout.title,
            blocks = response.workout.blocks.len(),
            risk = %response.safety_analysis.risk_level,
            "workout generated"
        );
        Ok(response)
    }

    /// Safety warnings for a request without any model call.
    ///
    /// 生成失败时界面仍可据此提示用户。
    pub fn safety_preview(&self, request: &GenerationRequest) -> SafetyAnalysis {
        safety::analyze(&request.session, &request.user_profile)
    }

    /// 快速模式：经典组次、全身、RPE 6，走 Fast 档
    pub async fn generate_quick(
        &self,
        profile: &UserProfile,
        focus: Option<&str>,
    ) -> Result<EnhancedWorkoutResponse> {
        let request = GenerationRequest {
            user_profile: profile.clone(),
            session: profile_session(profile, 30, WorkoutMode::Classic, 6),
            preferences: GenerationPreferences {
                focus_area: focus.map(str::to_string),
                ..GenerationPreferences::default()
            },
        };
        self.generate(&request, ModelType::Fast).await
    }

    /// 详细模式：更长的默认时长、RPE 7，走 Precise 档
    pub async fn generate_detailed(
        &self,
        profile: &UserProfile,
        workout_type: Option<&str>,
        additional_instructions: Option<&str>,
    ) -> Result<EnhancedWorkoutResponse> {
        let request = GenerationRequest {
            user_profile: profile.clone(),
            session: profile_session(profile, 45, WorkoutMode::Classic, 7),
            preferences: GenerationPreferences {
                workout_type: workout_type.map(str::to_string),
                additional_instructions: additional_instructions.map(str::to_string),
                ..GenerationPreferences::default()
            },
        };
        self.generate(&request, ModelType::Precise).await
    }

    /// 创意模式：EMOM、可选主题，走 Creative 档
    pub async fn generate_creative(
        &self,
        profile: &UserProfile,
        theme: Option<&str>,
    ) -> Result<EnhancedWorkoutResponse> {
        let request = GenerationRequest {
            user_profile: profile.clone(),
            session: profile_session(profile, 30, WorkoutMode::Emom, 7),
            preferences: GenerationPreferences {
                additional_instructions: theme
                    .map(|theme| format!("Create a {theme}-themed workout")),
                ..GenerationPreferences::default()
            },
        };
        self.generate(&request, ModelType::Creative).await
    }
}

/// Session defaults derived from the profile for the convenience wrappers.
fn profile_session(
    profile: &UserProfile,
    fallback_duration: u32,
    mode: WorkoutMode,
    intensity: u8,
) -> SessionParameters {
    let duration = if profile.workout_duration == 0 {
        fallback_duration
    } else {
        profile.workout_duration
    };
    SessionParameters {
        duration,
        goal: profile.fitness_goal.into(),
        target_muscle_groups: vec![MuscleGroup::FullBody],
        mode,
        intensity: Some(intensity),
        equipment: Some(equipment_for_category(profile.available_equipment)),
        pain_level: None,
        no_go_exercises: Vec::new(),
    }
}
