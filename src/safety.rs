//! Rule-based safety screening that runs before any model call.
//!
//! The model is also asked for a safety analysis, but the final response
//! always carries the locally computed one.

use serde::{Deserialize, Serialize};

use crate::profile::{FitnessLevel, UserProfile};
use crate::workout::SessionParameters;

/// Overall risk rating of a planned session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_risk_level() -> RiskLevel {
    RiskLevel::Low
}

/// Safety assessment attached to every generated workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnalysis {
    #[serde(default = "default_risk_level")]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub emergency_guidelines: Vec<String>,
}

impl Default for SafetyAnalysis {
    fn default() -> Self {
        Self {
            risk_level: RiskLevel::Low,
            contraindications: Vec::new(),
            modifications: Vec::new(),
            warnings: Vec::new(),
            emergency_guidelines: Vec::new(),
        }
    }
}

/// Screens a session request against the user's profile.
///
/// Pain tiers are exclusive: a level of 6+ only yields the high-pain
/// warning. Equipment is taken from the session as given, without the
/// profile fallback applied by the prompt builder.
pub fn safety_warnings(params: &SessionParameters, profile: &UserProfile) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(pain) = params.pain_level {
        if pain >= 6 {
            warnings.push(
                "HIGH PAIN LEVEL: Consider postponing intense exercise and focusing on gentle mobility"
                    .to_string(),
            );
        } else if pain >= 3 {
            warnings.push(
                "MODERATE PAIN: Reduce intensity and avoid movements that aggravate symptoms"
                    .to_string(),
            );
        }
    }

    if profile.age >= 65 {
        warnings.push(
            "SENIOR CONSIDERATIONS: Emphasize balance, fall prevention, and joint-friendly movements"
                .to_string(),
        );
    }

    if profile.fitness_level == FitnessLevel::Beginner {
        if let Some(intensity) = params.intensity {
            if intensity >= 8 {
                warnings.push(
                    "BEGINNER + HIGH INTENSITY: Consider reducing target RPE to build proper movement patterns"
                        .to_string(),
                );
            }
        }

        let has_weights = params
            .equipment
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .any(|eq| eq.is_free_weight());
        if has_weights {
            warnings.push(
                "BEGINNER + WEIGHTS: Emphasize proper form over load progression".to_string(),
            );
        }
    }

    warnings
}

/// Maps a warning count to an overall risk rating.
pub fn risk_level_for(warning_count: usize) -> RiskLevel {
    if warning_count > 2 {
        RiskLevel::High
    } else if warning_count > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Full local analysis for a session request.
pub fn analyze(params: &SessionParameters, profile: &UserProfile) -> SafetyAnalysis {
    let warnings = safety_warnings(params, profile);
    SafetyAnalysis {
        risk_level: risk_level_for(warnings.len()),
        contraindications: warnings,
        modifications: vec!["Adjust intensity based on comfort level".to_string()],
        warnings: Vec::new(),
        emergency_guidelines: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        CoachingStyle, EquipmentCategory, FitnessGoal, HumorLevel, WorkoutFrequency,
    };
    use crate::workout::{Equipment, MuscleGroup, WorkoutGoal, WorkoutMode};
    use pretty_assertions::assert_eq;

    fn profile(level: FitnessLevel, age: u32) -> UserProfile {
        UserProfile {
            name: "Test".to_string(),
            age,
            fitness_goal: FitnessGoal::GeneralFitness,
            fitness_level: level,
            workout_frequency: WorkoutFrequency::ThreeFour,
            available_equipment: EquipmentCategory::Basic,
            workout_duration: 30,
            injuries: vec![],
            no_go_exercises: vec![],
            pain_areas: vec![],
            rpe_understanding: false,
            workout_mode: CoachingStyle::Guided,
            humor_level: HumorLevel::Light,
        }
    }

    fn params() -> SessionParameters {
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

    #[test]
    fn test_no_warnings_for_healthy_request() {
        let warnings = safety_warnings(&params(), &profile(FitnessLevel::Intermediate, 30));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_high_pain_suppresses_moderate_tier() {
        let mut p = params();
        p.pain_level = Some(7);
        let warnings = safety_warnings(&p, &profile(FitnessLevel::Intermediate, 30));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("HIGH PAIN LEVEL"));
    }

    #[test]
    fn test_moderate_pain_tier() {
        let mut p = params();
        p.pain_level = Some(3);
        let warnings = safety_warnings(&p, &profile(FitnessLevel::Intermediate, 30));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("MODERATE PAIN"));
    }

    #[test]
    fn test_pain_below_threshold_is_quiet() {
        let mut p = params();
        p.pain_level = Some(2);
        assert!(safety_warnings(&p, &profile(FitnessLevel::Intermediate, 30)).is_empty());
    }

    #[test]
    fn test_senior_warning_at_65() {
        let warnings = safety_warnings(&params(), &profile(FitnessLevel::Intermediate, 65));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("SENIOR CONSIDERATIONS"));
    }

    #[test]
    fn test_beginner_high_intensity_warning() {
        let mut p = params();
        p.intensity = Some(8);
        let warnings = safety_warnings(&p, &profile(FitnessLevel::Beginner, 30));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("BEGINNER + HIGH INTENSITY"));
    }

    #[test]
    fn test_intermediate_high_intensity_is_fine() {
        let mut p = params();
        p.intensity = Some(9);
        assert!(safety_warnings(&p, &profile(FitnessLevel::Intermediate, 30)).is_empty());
    }

    #[test]
    fn test_beginner_with_free_weights_warning() {
        let mut p = params();
        p.equipment = Some(vec![Equipment::Dumbbells, Equipment::YogaMat]);
        let warnings = safety_warnings(&p, &profile(FitnessLevel::Beginner, 30));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("BEGINNER + WEIGHTS"));
    }

    #[test]
    fn test_session_equipment_absent_means_no_weights_warning() {
        // 器械回退只发生在提示词构建阶段
        let warnings = safety_warnings(&params(), &profile(FitnessLevel::Beginner, 30));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_warnings_accumulate() {
        let mut p = params();
        p.pain_level = Some(6);
        p.intensity = Some(9);
        p.equipment = Some(vec![Equipment::Barbell]);
        let warnings = safety_warnings(&p, &profile(FitnessLevel::Beginner, 66));
        assert_eq!(warnings.len(), 4);
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(risk_level_for(0), RiskLevel::Low);
        assert_eq!(risk_level_for(1), RiskLevel::Medium);
        assert_eq!(risk_level_for(2), RiskLevel::Medium);
        assert_eq!(risk_level_for(3), RiskLevel::High);
    }

    #[test]
    fn test_analyze_carries_warnings_as_contraindications() {
        let mut p = params();
        p.pain_level = Some(4);
        let analysis = analyze(&p, &profile(FitnessLevel::Intermediate, 30));
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.contraindications.len(), 1);
        assert_eq!(
            analysis.modifications,
            vec!["Adjust intensity based on comfort level".to_string()]
        );
    }
}
