use crate::error::Result;
use crate::llm::{GenerationRequest, ModelType};
use crate::profile::{FitnessGoal, FitnessLevel, UserProfile, WorkoutFrequency};
use crate::workout::{
    equipment_for_category, Equipment, SessionParameters, WorkoutGoal, WorkoutMode,
};

/// Fixed trainer persona, RPE/RIR guidance and the JSON response contract.
/// The `{mode}` marker is substituted with the session's workout mode token.
const SYSTEM_PROMPT_BASE: &str = r#"You are an expert fitness trainer and workout designer specializing in evidence-based, personalized workout programming. Your task is to create safe, effective, and engaging workout routines.

CORE PRINCIPLES:
- Prioritize safety and proper movement patterns
- Apply progressive overload principles
- Consider individual limitations and pain points
- Integrate RPE (Rate of Perceived Exertion) and RIR (Reps in Reserve) guidance
- Provide clear exercise progressions and regressions
- Include comprehensive safety analysis

RPE/RIR GUIDELINES:
- RPE Scale: 1-10 (1=very easy, 10=maximum effort)
- RIR Scale: 0-5+ (0=failure, 1=1 rep left, 2=2 reps left, etc.)
- Beginner: Target RPE 5-7, RIR 2-4
- Intermediate: Target RPE 6-8, RIR 1-3
- Advanced: Target RPE 7-9, RIR 0-2
- Always provide specific RPE/RIR targets for each exercise
- Include progression notes based on RPE feedback

WORKOUT MODES:
1. EMOM+AMRAP: 12-18 min EMOM block + 8-12 min AMRAP block
2. Classic Sets×Reps: 4-6 exercises, 3-5 sets, rep ranges based on goals
3. Circuit: Continuous movement patterns
4. Tabata: High-intensity intervals
5. Pyramid: Progressive loading patterns

SAFETY ANALYSIS REQUIREMENTS:
- Assess overall workout risk level (low/medium/high)
- Identify contraindications for each exercise
- Provide modifications for different ability levels
- Include specific warnings for high-risk movements
- Consider user's pain points and restrictions
- Ensure JSON schema compliance for all safety fields

RESPONSE FORMAT:
You must respond with a valid JSON object matching this EXACT structure:
{
  "workout": {
    "id": "unique-workout-id",
    "title": "Workout Name",
    "description": "Brief description",
    "totalDuration": 45,
    "difficulty": "medium",
    "mode": "{mode}",
    "warmup": {
      "id": "warmup-block",
      "type": "warmup",
      "name": "Dynamic Warm-up",
      "duration": 5,
      "exercises": [
        {
          "name": "Exercise Name",
          "description": "Purpose and benefits",
          "duration": 30,
          "restTime": 0,
          "difficulty": "easy",
          "equipment": ["bodyweight"],
          "muscleGroups": ["full_body"],
          "instructions": ["Step 1", "Step 2"],
          "modifications": ["Easier option"],
          "safetyNotes": ["Important safety note"]
        }
      ]
    },
    "blocks": [
      {
        "id": "main-block-1",
        "type": "strength",
        "name": "Block Name",
        "description": "Block purpose",
        "duration": 20,
        "exercises": [
          {
            "name": "Exercise Name",
            "description": "What this exercise does",
            "sets": 3,
            "reps": 12,
            "restTime": 60,
            "difficulty": "medium",
            "equipment": ["bodyweight"],
            "muscleGroups": ["chest", "triceps"],
            "instructions": ["Step 1", "Step 2", "Step 3"],
            "modifications": ["Easier: ...", "Harder: ..."],
            "targetRPE": 7,
            "targetRIR": 2,
            "safetyNotes": ["Form cue"],
            "contraindications": ["Avoid if..."]
          }
        ],
        "rounds": 3,
        "restBetweenExercises": 60
      }
    ],
    "cooldown": {
      "id": "cooldown-block",
      "type": "cooldown",
      "name": "Recovery & Mobility",
      "duration": 5,
      "exercises": [
        {
          "name": "Stretch Name",
          "description": "Targets specific muscles",
          "duration": 30,
          "restTime": 0,
          "difficulty": "easy",
          "equipment": ["bodyweight"],
          "muscleGroups": ["chest"],
          "instructions": ["Hold position"],
          "modifications": ["Use wall for support"]
        }
      ]
    },
    "tips": ["Performance tip 1", "Recovery tip 2"],
    "safetyNotes": ["General safety guideline"],
    "warnings": ["Important warning if applicable"]
  },
  "personalizedMessage": "Motivational message tailored to user",
  "modelUsed": "model-name",
  "rpeGuidance": {
    "targetIntensity": 7,
    "rpeScale": {
      "1": "Very easy - minimal effort",
      "2": "Easy - light effort",
      "3": "Moderate - noticeable effort",
      "4": "Somewhat hard - getting challenging",
      "5": "Hard - significant effort required",
      "6": "Harder - could do 4+ more reps",
      "7": "Very hard - could do 2-3 more reps",
      "8": "Extremely hard - could do 1-2 more reps",
      "9": "Near maximum - could do 1 more rep",
      "10": "Maximum effort - no more reps possible"
    },
    "adjustmentTips": [
      "Start conservatively and adjust based on how you feel",
      "If RPE is too low, increase weight/reps next set",
      "If RPE is too high, reduce weight/reps immediately",
      "Listen to your body and prioritize form over intensity"
    ],
    "progressionNotes": [
      "Week 1-2: Focus on form and movement patterns",
      "Week 3-4: Gradually increase intensity based on RPE feedback",
      "Week 5+: Progressive overload while maintaining target RPE ranges"
    ],
    "recoveryRecommendations": [
      "Take 48-72 hours rest between intense sessions",
      "Include active recovery on off days",
      "Monitor sleep and stress levels for optimal recovery"
    ]
  },
  "safetyAnalysis": {
    "riskLevel": "low",
    "contraindications": [
      "Avoid if experiencing acute pain in target areas",
      "Skip exercises that cause joint discomfort"
    ],
    "modifications": [
      "Reduce range of motion if flexibility is limited",
      "Use assistance or reduce load for proper form",
      "Substitute exercises based on equipment availability"
    ],
    "warnings": [
      "Stop immediately if sharp pain occurs",
      "Maintain proper breathing throughout exercises",
      "Ensure adequate warm-up before intense efforts"
    ],
    "emergencyGuidelines": [
      "Stop exercise if experiencing chest pain, dizziness, or severe shortness of breath",
      "Seek medical attention for any concerning symptoms"
    ]
  }
}"#;

const COMBINED_MODE_GUIDANCE: &str = r#"

WORKOUT MODE: EMOM + AMRAP
Structure:
1. EMOM Block (12-18 minutes): Every Minute on the Minute exercises
   - Choose 2-3 exercises that can be completed in 40-50 seconds
   - Focus on compound movements for maximum efficiency
   - Target RPE 6-7 to maintain consistency across all rounds
   - Progression: Increase reps per minute or exercise complexity
2. AMRAP Block (8-12 minutes): As Many Rounds As Possible
   - 3-5 exercises in a circuit format
   - Aim for sustainable pace, target RPE 7-8
   - Track total rounds completed for progression
   - Focus on metabolic conditioning and work capacity
- Block Structure: { "blocks": [{ "type": "emom", "duration": 15 }, { "type": "amrap", "duration": 10 }] }"#;

const CLASSIC_MODE_GUIDANCE: &str = r#"

WORKOUT MODE: Classic Sets × Reps
Structure:
- 4-6 primary exercises focusing on major movement patterns
- 3-5 sets per exercise based on training goal
- Rep ranges and RPE targets:
  * Strength: 3-6 reps at RPE 8-9 (RIR 1-2)
  * Hypertrophy: 8-12 reps at RPE 7-8 (RIR 2-3)
  * Endurance: 15+ reps at RPE 6-7 (RIR 3-4)
- Rest periods: Strength (2-3 min), Hypertrophy (60-90s), Endurance (30-60s)
- Progression: Increase weight when RPE drops below target range
- Block Structure: { "blocks": [{ "type": "strength", "exercises": [{ "sets": 4, "reps": "8-12", "targetRPE": 7 }] }] }"#;

const EMOM_MODE_GUIDANCE: &str = r#"

WORKOUT MODE: EMOM Training
- 6-10 exercises performed in sequence
- Work time: 30-60 seconds per exercise
- Rest: 10-15 seconds between exercises, 2-3 minutes between rounds
- 3-5 total rounds depending on fitness level
- Target RPE 6-8, focus on movement quality over speed
- Mix of strength and cardio movements for metabolic conditioning
- Progression: Increase work time, decrease rest, or add rounds
- Block Structure: { "blocks": [{ "type": "circuit", "rounds": 4, "workTime": 45, "restTime": 15 }] }"#;

const AMRAP_MODE_GUIDANCE: &str = r#"

WORKOUT MODE: AMRAP Protocol
- 20 seconds maximum effort, 10 seconds complete rest
- 8 rounds total (4 minutes per Tabata block)
- Target RPE 9-10 during work intervals
- Can chain 2-4 Tabata blocks with 2-3 minutes rest between
- Best for single, explosive movements (burpees, mountain climbers, etc.)
- Progression: Increase total rounds completed or add movement complexity
- Block Structure: { "blocks": [{ "type": "tabata", "workTime": 20, "restTime": 10, "rounds": 8 }] }"#;

const FAST_PERSONA: &str = r#"

AI PERSONALITY: FAST (Fast & Efficient)
- Create time-efficient, proven workout structures
- Focus on compound movements and functional patterns
- Keep instructions clear and actionable
- Optimize for maximum results in minimum time
- Use straightforward exercise progressions"#;

const PRECISE_PERSONA: &str = r#"

AI PERSONALITY: PRECISE (Precise & Scientific)
- Apply exercise science principles and biomechanics
- Include detailed form cues and movement analysis
- Provide comprehensive safety assessments
- Explain physiological adaptations and training rationale
- Use precise RPE/RIR targeting for optimal load management
- Include detailed progression and regression pathways"#;

const CREATIVE_PERSONA: &str = r#"

AI PERSONALITY: CREATIVE (Creative & Engaging)
- Design innovative and enjoyable workout experiences
- Include creative exercise variations and flow patterns
- Add motivational elements and achievement milestones
- Incorporate themed workouts and storytelling elements
- Use gamification principles to enhance engagement
- Adapt communication style to user's humor preferences"#;

/// Programming rules appended for the session's workout mode.
fn mode_guidance(mode: WorkoutMode) -> &'static str {
    match mode {
        WorkoutMode::Combined => COMBINED_MODE_GUIDANCE,
        WorkoutMode::Classic => CLASSIC_MODE_GUIDANCE,
        WorkoutMode::Emom => EMOM_MODE_GUIDANCE,
        WorkoutMode::Amrap => AMRAP_MODE_GUIDANCE,
    }
}

/// 系统提示词 = 基础契约 + 模式规则 + 人格段（Custom 档不追加人格）。
pub fn build_system_prompt(model_type: ModelType, mode: WorkoutMode) -> String {
    let base = SYSTEM_PROMPT_BASE.replace("{mode}", mode.as_str());
    let persona = match model_type {
        ModelType::Fast => FAST_PERSONA,
        ModelType::Precise => PRECISE_PERSONA,
        ModelType::Creative => CREATIVE_PERSONA,
        ModelType::Custom => "",
    };
    format!("{}{}{}", base, mode_guidance(mode), persona)
}

const STRENGTH_FOCUS: &str = "Heavy compound movements, lower reps, longer rest";
const HYPERTROPHY_FOCUS: &str = "Moderate weights, 8-12 rep range, muscle isolation";
const METABOLIC_FOCUS: &str = "Higher intensity, circuit training, metabolic focus";
const ENDURANCE_FOCUS: &str = "Higher reps, shorter rest, cardiovascular integration";
const MOBILITY_FOCUS: &str = "Dynamic stretching, mobility work, range of motion focus";
const BALANCED_FOCUS: &str = "Balanced approach, functional movements, varied intensity";

fn fitness_level_adaptations(level: FitnessLevel) -> &'static str {
    match level {
        FitnessLevel::Beginner => {
            "Focus on movement quality, basic patterns, bodyweight progressions, longer rest periods"
        }
        FitnessLevel::Intermediate => {
            "Moderate complexity, compound movements, progressive overload, balanced intensity"
        }
        FitnessLevel::Advanced => {
            "Complex movements, advanced techniques, higher intensity, shorter rest periods"
        }
    }
}

fn profile_goal_focus(goal: FitnessGoal) -> Option<&'static str> {
    match goal {
        FitnessGoal::Strength => Some(STRENGTH_FOCUS),
        FitnessGoal::MuscleGain => Some(HYPERTROPHY_FOCUS),
        FitnessGoal::WeightLoss => Some(METABOLIC_FOCUS),
        FitnessGoal::Endurance => Some(ENDURANCE_FOCUS),
        FitnessGoal::GeneralFitness => Some(BALANCED_FOCUS),
        FitnessGoal::Rehabilitation | FitnessGoal::SportSpecific => None,
    }
}

fn session_goal_focus(goal: WorkoutGoal) -> Option<&'static str> {
    match goal {
        WorkoutGoal::Strength => Some(STRENGTH_FOCUS),
        WorkoutGoal::MuscleGain => Some(HYPERTROPHY_FOCUS),
        WorkoutGoal::WeightLoss => Some(METABOLIC_FOCUS),
        WorkoutGoal::Endurance => Some(ENDURANCE_FOCUS),
        WorkoutGoal::Flexibility => Some(MOBILITY_FOCUS),
        WorkoutGoal::GeneralFitness => Some(BALANCED_FOCUS),
        WorkoutGoal::Rehabilitation | WorkoutGoal::SportSpecific => None,
    }
}

/// Long-term goal and session goal can resolve to the same text; the
/// duplicate collapses into a single entry.
fn goal_customizations(primary: FitnessGoal, session: WorkoutGoal) -> String {
    let mut texts: Vec<&'static str> = Vec::new();
    if let Some(text) = profile_goal_focus(primary) {
        texts.push(text);
    }
    if let Some(text) = session_goal_focus(session) {
        if !texts.contains(&text) {
            texts.push(text);
        }
    }
    if texts.is_empty() {
        return "Balanced fitness approach".to_string();
    }
    texts.join("; ")
}

fn equipment_optimization(equipment: &[Equipment]) -> String {
    if equipment.is_empty() {
        return "Bodyweight-only exercises with creative progressions and variations".to_string();
    }

    let mut strategies: Vec<&'static str> = Vec::new();
    if equipment.contains(&Equipment::Dumbbells) {
        strategies.push("Unilateral training, functional patterns");
    }
    if equipment.contains(&Equipment::Barbell) {
        strategies.push("Heavy compound lifts, bilateral strength");
    }
    if equipment.contains(&Equipment::ResistanceBands) {
        strategies.push("Variable resistance, joint-friendly options");
    }
    if equipment.contains(&Equipment::Kettlebell) {
        strategies.push("Ballistic movements, functional strength");
    }
    if equipment.contains(&Equipment::PullUpBar) {
        strategies.push("Upper body pulling, bodyweight progressions");
    }

    if strategies.is_empty() {
        return "Optimize available equipment for maximum effectiveness".to_string();
    }
    strategies.join("; ")
}

fn frequency_adjustments(frequency: WorkoutFrequency) -> &'static str {
    match frequency {
        WorkoutFrequency::OneTwo => {
            "Full-body focus, higher volume per session, longer recovery"
        }
        WorkoutFrequency::ThreeFour => "Push/pull/legs or full-body, balanced programming",
        WorkoutFrequency::FiveSix => {
            "Body part splits, higher frequency, lower volume per session"
        }
        WorkoutFrequency::Daily => "Flexible programming based on recovery capacity",
    }
}

/// Conditional coaching hints derived from profile and session together.
/// The equipment rule looks at the session's explicit list only, not the
/// profile tier fallback.
fn adaptive_recommendations(
    profile: &UserProfile,
    session: &SessionParameters,
) -> Vec<&'static str> {
    let mut recommendations = Vec::new();

    if profile.age >= 50 {
        recommendations.push("Include mobility work and joint-friendly exercises");
    }
    if profile.age >= 65 {
        recommendations.push("Emphasize balance and fall prevention exercises");
    }
    if !profile.pain_areas.is_empty() {
        recommendations.push("Include corrective exercises and avoid aggravating movements");
    }
    if session.pain_level.map_or(false, |p| p >= 3) {
        recommendations.push("Reduce intensity and focus on gentle movement");
    }
    if session.equipment.as_ref().map_or(true, |e| e.is_empty()) {
        recommendations.push("Emphasize bodyweight progressions and isometric holds");
    }
    if profile.fitness_goal.as_str() != session.goal.as_str() {
        recommendations.push("Balance long-term goals with immediate session objectives");
    }
    if profile.workout_frequency == WorkoutFrequency::OneTwo {
        recommendations.push("Maximize session efficiency with compound movements");
    }

    recommendations
}

/// 用户提示词：画像、器械、会话参数、安全事项、个性化分析与安全页脚，
/// 按固定顺序拼接。构建前先做请求校验。
pub fn build_user_prompt(request: &GenerationRequest) -> Result<String> {
    request.validate()?;

    let profile = &request.user_profile;
    let session = &request.session;

    // Session equipment wins over the profile tier, even when explicitly empty.
    let equipment = match &session.equipment {
        Some(list) => list.clone(),
        None => equipment_for_category(profile.available_equipment),
    };

    let mut prompt = String::from("Create a personalized workout for:\n\n");

    prompt.push_str("USER PROFILE:\n");
    let name = if profile.name.is_empty() {
        "User"
    } else {
        profile.name.as_str()
    };
    prompt.push_str(&format!("- Name: {}\n", name));
    let age = if profile.age == 0 { 25 } else { profile.age };
    prompt.push_str(&format!("- Age: {}\n", age));
    prompt.push_str(&format!(
        "- Fitness Level: {}\n",
        profile.fitness_level.as_str()
    ));
    prompt.push_str(&format!(
        "- Primary Goal: {}\n",
        profile.fitness_goal.as_str()
    ));
    prompt.push_str(&format!(
        "- Workout Frequency: {}\n",
        profile.workout_frequency.as_str()
    ));

    if equipment.is_empty() {
        prompt.push_str("- Available Equipment: Bodyweight only\n");
    } else {
        let names: Vec<&str> = equipment.iter().map(|e| e.as_str()).collect();
        prompt.push_str(&format!("- Available Equipment: {}\n", names.join(", ")));
    }

    prompt.push_str("\nSESSION PARAMETERS:\n");
    prompt.push_str(&format!("- Duration: {} minutes\n", session.duration));
    prompt.push_str(&format!("- Goal: {}\n", session.goal.as_str()));
    prompt.push_str(&format!("- Mode: {}\n", session.mode.as_str()));
    let muscle_groups: Vec<&str> = session
        .target_muscle_groups
        .iter()
        .map(|g| g.as_str())
        .collect();
    prompt.push_str(&format!(
        "- Target Muscle Groups: {}\n",
        muscle_groups.join(", ")
    ));

    if let Some(intensity) = session.intensity {
        prompt.push_str(&format!("- Target Intensity (RPE): {}/10\n", intensity));
    }

    prompt.push_str("\nSAFETY CONSIDERATIONS:\n");

    if let Some(pain_level) = session.pain_level {
        prompt.push_str(&format!("- Current Pain Level: {}/10\n", pain_level));
        if pain_level >= 3 {
            prompt.push_str(
                "- ⚠️ ELEVATED PAIN DETECTED: Modify intensity and avoid aggravating movements\n",
            );
        }
        if pain_level >= 6 {
            prompt.push_str(
                "- 🚨 HIGH PAIN LEVEL: Focus on gentle mobility and recovery exercises only\n",
            );
        }
    }

    if !profile.pain_areas.is_empty() {
        prompt.push_str(&format!(
            "- Chronic Pain Areas: {}\n",
            profile.pain_areas.join(", ")
        ));
    }

    let mut no_go: Vec<&str> = Vec::new();
    no_go.extend(session.no_go_exercises.iter().map(String::as_str));
    no_go.extend(profile.no_go_exercises.iter().map(String::as_str));
    if !no_go.is_empty() {
        prompt.push_str(&format!("- STRICTLY AVOID: {}\n", no_go.join(", ")));
    }

    prompt.push_str("\nADVANCED PERSONALIZATION:\n");
    prompt.push_str(&format!(
        "- Fitness Level Adaptations: {}\n",
        fitness_level_adaptations(profile.fitness_level)
    ));
    prompt.push_str(&format!(
        "- Goal-Specific Focus: {}\n",
        goal_customizations(profile.fitness_goal, session.goal)
    ));
    prompt.push_str(&format!(
        "- Equipment Strategy: {}\n",
        equipment_optimization(&equipment)
    ));
    prompt.push_str(&format!(
        "- Frequency Adjustments: {}\n",
        frequency_adjustments(profile.workout_frequency)
    ));
    prompt.push_str(&format!("- Humor Level: {}\n", profile.humor_level.as_str()));
    prompt.push_str(&format!(
        "- Coaching Style: {}\n",
        profile.workout_mode.as_str()
    ));

    let recommendations = adaptive_recommendations(profile, session);
    if !recommendations.is_empty() {
        prompt.push_str(&format!(
            "- Adaptive Recommendations: {}\n",
            recommendations.join(", ")
        ));
    }

    if let Some(workout_type) = &request.preferences.workout_type {
        prompt.push_str(&format!("\nWORKOUT TYPE: {}\n", workout_type));
    }
    if let Some(focus_area) = &request.preferences.focus_area {
        prompt.push_str(&format!("FOCUS AREA: {}\n", focus_area));
    }
    if let Some(instructions) = &request.preferences.additional_instructions {
        prompt.push_str(&format!("\nADDITIONAL INSTRUCTIONS: {}\n", instructions));
    }

    prompt.push_str("\n🔒 SAFETY REQUIREMENTS:\n");
    prompt.push_str("- Perform comprehensive safety analysis\n");
    prompt.push_str("- Include contraindications for each exercise\n");
    prompt.push_str("- Provide modifications for different ability levels\n");
    prompt.push_str("- Flag any high-risk movements\n");
    prompt.push_str("- Consider user's pain points and restrictions\n");

    prompt.push_str(
        "\nPlease create a complete workout routine following the specified JSON structure. Prioritize safety above all else.",
    );

    Ok(prompt)
}
