//! User profile domain types.

use serde::{Deserialize, Serialize};

/// Self-reported training experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "beginner",
            FitnessLevel::Intermediate => "intermediate",
            FitnessLevel::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Long-term training objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    WeightLoss,
    MuscleGain,
    Strength,
    Endurance,
    GeneralFitness,
    Rehabilitation,
    SportSpecific,
}

impl FitnessGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessGoal::WeightLoss => "weight_loss",
            FitnessGoal::MuscleGain => "muscle_gain",
            FitnessGoal::Strength => "strength",
            FitnessGoal::Endurance => "endurance",
            FitnessGoal::GeneralFitness => "general_fitness",
            FitnessGoal::Rehabilitation => "rehabilitation",
            FitnessGoal::SportSpecific => "sport_specific",
        }
    }
}

impl std::fmt::Display for FitnessGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekly training cadence, as chosen during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutFrequency {
    #[serde(rename = "1-2")]
    OneTwo,
    #[serde(rename = "3-4")]
    ThreeFour,
    #[serde(rename = "5-6")]
    FiveSix,
    #[serde(rename = "daily")]
    Daily,
}

impl WorkoutFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutFrequency::OneTwo => "1-2",
            WorkoutFrequency::ThreeFour => "3-4",
            WorkoutFrequency::FiveSix => "5-6",
            WorkoutFrequency::Daily => "daily",
        }
    }
}

impl std::fmt::Display for WorkoutFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad equipment tier the user has access to.
///
/// Expanded to a concrete equipment list by
/// [`equipment_for_category`](crate::workout::equipment_for_category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    None,
    Basic,
    HomeGym,
    FullGym,
}

impl EquipmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentCategory::None => "none",
            EquipmentCategory::Basic => "basic",
            EquipmentCategory::HomeGym => "home_gym",
            EquipmentCategory::FullGym => "full_gym",
        }
    }
}

/// How the user wants to be coached through a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoachingStyle {
    Guided,
    Flexible,
    Challenge,
}

impl CoachingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoachingStyle::Guided => "guided",
            CoachingStyle::Flexible => "flexible",
            CoachingStyle::Challenge => "challenge",
        }
    }
}

/// Tone preference for generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumorLevel {
    None,
    Light,
    Moderate,
    High,
}

impl HumorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HumorLevel::None => "none",
            HumorLevel::Light => "light",
            HumorLevel::Moderate => "moderate",
            HumorLevel::High => "high",
        }
    }
}

/// Everything the prompt builder needs to know about a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub fitness_goal: FitnessGoal,
    pub fitness_level: FitnessLevel,
    pub workout_frequency: WorkoutFrequency,
    pub available_equipment: EquipmentCategory,
    /// Preferred session length in minutes.
    pub workout_duration: u32,
    #[serde(default)]
    pub injuries: Vec<String>,
    #[serde(default)]
    pub no_go_exercises: Vec<String>,
    #[serde(default)]
    pub pain_areas: Vec<String>,
    /// Whether the user already understands the RPE scale.
    #[serde(default)]
    pub rpe_understanding: bool,
    pub workout_mode: CoachingStyle,
    pub humor_level: HumorLevel,
}
