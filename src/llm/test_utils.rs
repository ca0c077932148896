//! Test utilities for the generation pipeline
//!
//! Provides shared fixtures (profile, session, canned model output) to
//! reduce duplication across pipeline test suites.

use crate::llm::{GenerationPreferences, GenerationRequest};
use crate::profile::{
    CoachingStyle, EquipmentCategory, FitnessGoal, FitnessLevel, HumorLevel, UserProfile,
    WorkoutFrequency,
};
use crate::workout::{MuscleGroup, SessionParameters, WorkoutGoal, WorkoutMode};

/// 在测试中安装 rustls crypto provider
///
/// reqwest 0.13 + rustls-no-provider 需要手动安装 crypto provider，
/// 生产代码在 lib.rs 的 `init_tls` 中完成，测试需要单独调用。
/// 多次调用是安全的（install_default 失败时忽略即可）。
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Create a complete intermediate-level profile for tests.
///
/// # Example
/// ```
/// use fittrack_rs::llm::test_utils::sample_profile;
///
/// let profile = sample_profile();
/// assert_eq!(profile.name, "Alex");
/// ```
pub fn sample_profile() -> UserProfile {
    UserProfile {
        name: "Alex".to_string(),
        age: 31,
        fitness_goal: FitnessGoal::MuscleGain,
        fitness_level: FitnessLevel::Intermediate,
        workout_frequency: WorkoutFrequency::ThreeFour,
        available_equipment: EquipmentCategory::Basic,
        workout_duration: 45,
        injuries: Vec::new(),
        no_go_exercises: Vec::new(),
        pain_areas: Vec::new(),
        rpe_understanding: true,
        workout_mode: CoachingStyle::Guided,
        humor_level: HumorLevel::Light,
    }
}

/// Create session parameters that pass validation: 45 minute classic
/// session targeting chest and back.
pub fn sample_session() -> SessionParameters {
    SessionParameters {
        duration: 45,
        goal: WorkoutGoal::MuscleGain,
        target_muscle_groups: vec![MuscleGroup::Chest, MuscleGroup::Back],
        mode: WorkoutMode::Classic,
        intensity: Some(7),
        equipment: None,
        pain_level: None,
        no_go_exercises: Vec::new(),
    }
}

/// Bundle [`sample_profile`] and [`sample_session`] into a full request
/// with empty preferences.
pub fn sample_request() -> GenerationRequest {
    GenerationRequest {
        user_profile: sample_profile(),
        session: sample_session(),
        preferences: GenerationPreferences::default(),
    }
}

/// A well-formed model reply that decodes without any repair pass.
///
/// Useful as the `content` of a mocked chat completion. The payload
/// deliberately omits ids and the personalized message so tests can
/// observe the normalization pass filling them in.
pub fn sample_workout_json() -> &'static str {
    r#"{
  "workout": {
    "title": "Upper Body Builder",
    "description": "Classic chest and back session",
    "totalDuration": 45,
    "difficulty": "medium",
    "mode": "classic",
    "warmup": {
      "type": "warmup",
      "name": "Dynamic Warm-up",
      "duration": 5,
      "exercises": [
        {
          "name": "Arm Circles",
          "description": "Shoulder preparation",
          "duration": 30,
          "restTime": 0,
          "difficulty": "easy",
          "equipment": ["bodyweight"],
          "muscleGroups": ["shoulders"],
          "instructions": ["Small circles forward", "Reverse direction"]
        }
      ]
    },
    "blocks": [
      {
        "type": "strength",
        "name": "Push Focus",
        "duration": 18,
        "exercises": [
          {
            "name": "Push-up",
            "description": "Horizontal press",
            "sets": 4,
            "reps": 10,
            "restTime": 60,
            "difficulty": "medium",
            "equipment": ["bodyweight"],
            "muscleGroups": ["chest", "triceps"],
            "instructions": ["Brace the core", "Lower under control"],
            "modifications": ["Easier: knee push-up", "Harder: tempo push-up"],
            "targetRPE": 7,
            "targetRIR": 2
          }
        ],
        "rounds": 1,
        "restBetweenExercises": 60
      },
      {
        "type": "strength",
        "name": "Pull Focus",
        "duration": 17,
        "exercises": [
          {
            "name": "Band Row",
            "description": "Horizontal pull",
            "sets": 4,
            "reps": 12,
            "restTime": 60,
            "difficulty": "medium",
            "equipment": ["resistance_bands"],
            "muscleGroups": ["back", "biceps"],
            "instructions": ["Squeeze the shoulder blades"],
            "targetRPE": 7,
            "targetRIR": 2
          }
        ],
        "rounds": 1,
        "restBetweenExercises": 60
      }
    ],
    "cooldown": {
      "type": "cooldown",
      "name": "Recovery & Mobility",
      "duration": 5,
      "exercises": [
        {
          "name": "Doorway Chest Stretch",
          "description": "Opens the chest after pressing",
          "duration": 30,
          "restTime": 0,
          "difficulty": "easy",
          "equipment": ["bodyweight"],
          "muscleGroups": ["chest"],
          "instructions": ["Hold position"]
        }
      ]
    },
    "tips": ["Keep rest timers honest"],
    "safetyNotes": ["Stop on sharp pain"]
  },
  "rpeGuidance": {
    "targetIntensity": 7
  },
  "safetyAnalysis": {
    "riskLevel": "low",
    "contraindications": [],
    "modifications": []
  }
}"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_session_passes_validation() {
        assert!(sample_session().validate().is_ok());
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_sample_workout_json_is_well_formed() {
        let value: serde_json::Value = serde_json::from_str(sample_workout_json()).unwrap();
        assert_eq!(value["workout"]["title"], "Upper Body Builder");
        assert_eq!(value["workout"]["blocks"].as_array().unwrap().len(), 2);
    }
}
