//! Workout domain types shared between prompts, parsing and callers.
//!
//! The wire format (camelCase, closed token sets) is the one the model is
//! instructed to emit, so these types double as the response schema.

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::profile::{EquipmentCategory, FitnessGoal};

/// Session structure requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutMode {
    Classic,
    Emom,
    Amrap,
    Combined,
}

impl WorkoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutMode::Classic => "classic",
            WorkoutMode::Emom => "emom",
            WorkoutMode::Amrap => "amrap",
            WorkoutMode::Combined => "combined",
        }
    }
}

impl std::fmt::Display for WorkoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural role of a block inside a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Warmup,
    Emom,
    Amrap,
    Strength,
    Conditioning,
    Cooldown,
}

/// Per-exercise difficulty as emitted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Concrete equipment tokens used in prompts and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Bodyweight,
    Dumbbells,
    Barbell,
    Kettlebell,
    ResistanceBands,
    PullUpBar,
    Bench,
    YogaMat,
    StabilityBall,
    FoamRoller,
    Treadmill,
    StationaryBike,
    RowingMachine,
}

impl Equipment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Equipment::Bodyweight => "bodyweight",
            Equipment::Dumbbells => "dumbbells",
            Equipment::Barbell => "barbell",
            Equipment::Kettlebell => "kettlebell",
            Equipment::ResistanceBands => "resistance_bands",
            Equipment::PullUpBar => "pull_up_bar",
            Equipment::Bench => "bench",
            Equipment::YogaMat => "yoga_mat",
            Equipment::StabilityBall => "stability_ball",
            Equipment::FoamRoller => "foam_roller",
            Equipment::Treadmill => "treadmill",
            Equipment::StationaryBike => "stationary_bike",
            Equipment::RowingMachine => "rowing_machine",
        }
    }

    /// Free weights that warrant extra caution for beginners.
    pub fn is_free_weight(&self) -> bool {
        matches!(
            self,
            Equipment::Dumbbells | Equipment::Barbell | Equipment::Kettlebell
        )
    }
}

impl std::fmt::Display for Equipment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expands an equipment tier into the concrete equipment list used in
/// prompts and safety checks.
pub fn equipment_for_category(category: EquipmentCategory) -> Vec<Equipment> {
    match category {
        EquipmentCategory::None => vec![],
        EquipmentCategory::Basic => vec![
            Equipment::Dumbbells,
            Equipment::ResistanceBands,
            Equipment::YogaMat,
        ],
        EquipmentCategory::HomeGym => vec![
            Equipment::Dumbbells,
            Equipment::Barbell,
            Equipment::ResistanceBands,
            Equipment::PullUpBar,
            Equipment::Bench,
            Equipment::YogaMat,
        ],
        EquipmentCategory::FullGym => vec![
            Equipment::Dumbbells,
            Equipment::Barbell,
            Equipment::Kettlebell,
            Equipment::ResistanceBands,
            Equipment::PullUpBar,
            Equipment::Bench,
            Equipment::YogaMat,
            Equipment::StabilityBall,
            Equipment::Treadmill,
            Equipment::StationaryBike,
            Equipment::RowingMachine,
        ],
    }
}

/// Muscle group tokens used in prompts and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Abs,
    Obliques,
    LowerBack,
    Quadriceps,
    Hamstrings,
    Glutes,
    Calves,
    FullBody,
    Core,
}

impl MuscleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Forearms => "forearms",
            MuscleGroup::Abs => "abs",
            MuscleGroup::Obliques => "obliques",
            MuscleGroup::LowerBack => "lower_back",
            MuscleGroup::Quadriceps => "quadriceps",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Calves => "calves",
            MuscleGroup::FullBody => "full_body",
            MuscleGroup::Core => "core",
        }
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immediate objective of a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutGoal {
    WeightLoss,
    MuscleGain,
    Strength,
    Endurance,
    Flexibility,
    GeneralFitness,
    SportSpecific,
    Rehabilitation,
}

impl WorkoutGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutGoal::WeightLoss => "weight_loss",
            WorkoutGoal::MuscleGain => "muscle_gain",
            WorkoutGoal::Strength => "strength",
            WorkoutGoal::Endurance => "endurance",
            WorkoutGoal::Flexibility => "flexibility",
            WorkoutGoal::GeneralFitness => "general_fitness",
            WorkoutGoal::SportSpecific => "sport_specific",
            WorkoutGoal::Rehabilitation => "rehabilitation",
        }
    }
}

impl std::fmt::Display for WorkoutGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 长期目标直接映射为单次目标（两个枚举在此子集上同名）
impl From<FitnessGoal> for WorkoutGoal {
    fn from(goal: FitnessGoal) -> Self {
        match goal {
            FitnessGoal::WeightLoss => WorkoutGoal::WeightLoss,
            FitnessGoal::MuscleGain => WorkoutGoal::MuscleGain,
            FitnessGoal::Strength => WorkoutGoal::Strength,
            FitnessGoal::Endurance => WorkoutGoal::Endurance,
            FitnessGoal::GeneralFitness => WorkoutGoal::GeneralFitness,
            FitnessGoal::Rehabilitation => WorkoutGoal::Rehabilitation,
            FitnessGoal::SportSpecific => WorkoutGoal::SportSpecific,
        }
    }
}

/// What the user asked for in this specific session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParameters {
    /// Total workout duration in minutes.
    pub duration: u32,
    pub goal: WorkoutGoal,
    pub target_muscle_groups: Vec<MuscleGroup>,
    pub mode: WorkoutMode,
    /// Target intensity on the RPE 1-10 scale.
    pub intensity: Option<u8>,
    /// Explicit equipment override; falls back to the profile tier when absent.
    pub equipment: Option<Vec<Equipment>>,
    /// Current pain level on a 0-10 scale.
    pub pain_level: Option<u8>,
    #[serde(default)]
    pub no_go_exercises: Vec<String>,
}

impl SessionParameters {
    /// Rejects parameter combinations that would produce a useless prompt.
    pub fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(FitError::Validation(
                rust_i18n::t!("validation.duration_zero").to_string(),
            ));
        }
        if self.target_muscle_groups.is_empty() {
            return Err(FitError::Validation(
                rust_i18n::t!("validation.muscle_groups_empty").to_string(),
            ));
        }
        if let Some(intensity) = self.intensity {
            if !(1..=10).contains(&intensity) {
                return Err(FitError::Validation(
                    rust_i18n::t!("validation.intensity_range").to_string(),
                ));
            }
        }
        if let Some(pain) = self.pain_level {
            if pain > 10 {
                return Err(FitError::Validation(
                    rust_i18n::t!("validation.pain_range").to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Rep prescription, either a count or a scheme like "AMRAP" or "8-12".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Scheme(String),
}

fn default_rest_time() -> u32 {
    60
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

fn default_exercise_equipment() -> Vec<Equipment> {
    vec![Equipment::Bodyweight]
}

fn default_block_duration() -> u32 {
    15
}

fn default_rounds() -> u32 {
    1
}

fn default_total_duration() -> u32 {
    30
}

/// One exercise as emitted by the model.
///
/// Absent fields deserialize to the documented defaults; unknown token
/// values are a parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<Reps>,
    /// Work duration in seconds, for time-based exercises.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default = "default_rest_time")]
    pub rest_time: u32,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default = "default_exercise_equipment")]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub muscle_groups: Vec<MuscleGroup>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default, rename = "targetRPE")]
    pub target_rpe: Option<u8>,
    #[serde(default, rename = "targetRIR")]
    pub target_rir: Option<u8>,
    #[serde(default)]
    pub safety_notes: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
}

/// A contiguous block of exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutBlock {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "default_block_type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Block duration in minutes.
    #[serde(default = "default_block_duration")]
    pub duration: u32,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default = "default_rest_time")]
    pub rest_between_exercises: u32,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Work interval in seconds, for EMOM and AMRAP blocks.
    #[serde(default)]
    pub work_time: Option<u32>,
    /// Rest interval in seconds, for EMOM and AMRAP blocks.
    #[serde(default)]
    pub rest_time: Option<u32>,
}

fn default_block_type() -> BlockType {
    BlockType::Strength
}

impl Default for WorkoutBlock {
    fn default() -> Self {
        Self {
            id: String::new(),
            block_type: BlockType::Strength,
            name: String::new(),
            description: String::new(),
            duration: default_block_duration(),
            exercises: Vec::new(),
            instructions: Vec::new(),
            rest_between_exercises: default_rest_time(),
            rounds: default_rounds(),
            work_time: None,
            rest_time: None,
        }
    }
}

/// The complete workout plan extracted from a model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWorkout {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Total duration in minutes.
    #[serde(default = "default_total_duration", alias = "duration")]
    pub total_duration: u32,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    /// Echo of the requested workout mode.
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub warmup: WorkoutBlock,
    #[serde(default)]
    pub blocks: Vec<WorkoutBlock>,
    #[serde(default)]
    pub cooldown: WorkoutBlock,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub safety_notes: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base_params() -> SessionParameters {
        SessionParameters {
            duration: 30,
            goal: WorkoutGoal::GeneralFitness,
            target_muscle_groups: vec![MuscleGroup::FullBody],
            mode: WorkoutMode::Classic,
            intensity: Some(6),
            equipment: None,
            pain_level: None,
            no_go_exercises: vec![],
        }
    }

    // === 参数校验 ===

    #[test]
    fn test_validate_accepts_base_params() {
        assert!(base_params().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut params = base_params();
        params.duration = 0;
        assert!(matches!(params.validate(), Err(FitError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_muscle_groups() {
        let mut params = base_params();
        params.target_muscle_groups.clear();
        assert!(matches!(params.validate(), Err(FitError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_intensity() {
        let mut params = base_params();
        params.intensity = Some(11);
        assert!(params.validate().is_err());
        params.intensity = Some(0);
        assert!(params.validate().is_err());
        params.intensity = Some(10);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_pain() {
        let mut params = base_params();
        params.pain_level = Some(11);
        assert!(params.validate().is_err());
        params.pain_level = Some(10);
        assert!(params.validate().is_ok());
    }

    // === 序列化 ===

    #[test]
    fn test_reps_accepts_count_and_scheme() {
        let count: Reps = serde_json::from_str("12").unwrap();
        assert_eq!(count, Reps::Count(12));
        let scheme: Reps = serde_json::from_str("\"AMRAP\"").unwrap();
        assert_eq!(scheme, Reps::Scheme("AMRAP".to_string()));
    }

    #[test]
    fn test_exercise_defaults_when_fields_absent() {
        let exercise: WorkoutExercise =
            serde_json::from_str(r#"{"name": "Push-up"}"#).unwrap();
        assert_eq!(exercise.rest_time, 60);
        assert_eq!(exercise.difficulty, Difficulty::Medium);
        assert_eq!(exercise.equipment, vec![Equipment::Bodyweight]);
        assert!(exercise.muscle_groups.is_empty());
        assert!(exercise.target_rpe.is_none());
    }

    #[test]
    fn test_exercise_rpe_field_names() {
        let exercise: WorkoutExercise =
            serde_json::from_str(r#"{"name": "Squat", "targetRPE": 7, "targetRIR": 2}"#).unwrap();
        assert_eq!(exercise.target_rpe, Some(7));
        assert_eq!(exercise.target_rir, Some(2));
    }

    #[test]
    fn test_exercise_rejects_unknown_equipment_token() {
        let result: std::result::Result<WorkoutExercise, _> =
            serde_json::from_str(r#"{"name": "Curl", "equipment": ["space_laser"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_block_defaults() {
        let block: WorkoutBlock = serde_json::from_str(r#"{"exercises": []}"#).unwrap();
        assert_eq!(block.block_type, BlockType::Strength);
        assert_eq!(block.duration, 15);
        assert_eq!(block.rounds, 1);
        assert_eq!(block.rest_between_exercises, 60);
    }

    #[test]
    fn test_workout_accepts_duration_alias() {
        let workout: GeneratedWorkout =
            serde_json::from_str(r#"{"title": "Test", "duration": 40}"#).unwrap();
        assert_eq!(workout.total_duration, 40);
    }

    // === 器械展开 ===

    #[test]
    fn test_equipment_for_category() {
        assert!(equipment_for_category(EquipmentCategory::None).is_empty());
        assert_eq!(equipment_for_category(EquipmentCategory::Basic).len(), 3);
        assert_eq!(equipment_for_category(EquipmentCategory::HomeGym).len(), 6);
        assert_eq!(equipment_for_category(EquipmentCategory::FullGym).len(), 11);
    }

    #[test]
    fn test_free_weight_detection() {
        assert!(Equipment::Barbell.is_free_weight());
        assert!(Equipment::Kettlebell.is_free_weight());
        assert!(!Equipment::ResistanceBands.is_free_weight());
        assert!(!Equipment::Bodyweight.is_free_weight());
    }
}
