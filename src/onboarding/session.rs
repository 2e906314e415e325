//! The in-progress onboarding session — every wizard answer in one typed
//! aggregate.
//!
//! The session is owned by the flow controller and mutated only through
//! `SessionPatch` while the wizard is active. There is no secondary copy of
//! any answer; invariants are enforced here and in the screen gates.

use serde::{Deserialize, Serialize};

use super::model::{
    ActivityLevel, DietaryRestriction, EatingChallenge, EnergyPattern, ExerciseFrequency,
    ExerciseType, FeaturePreference, GuidanceLevel, HealthGoal, IntegrationPreference,
    LearningStyle, LifestyleChallenge, MealTimingPreference, PhysicalStats, WeightPlan,
    WorkSchedule,
};

/// Wizard answers collected so far. Created empty when onboarding starts,
/// finalized into a `UserProfile` at the terminal screen, then discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingSession {
    #[serde(default)]
    pub selected_goals: Vec<HealthGoal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_goal: Option<HealthGoal>,
    #[serde(default)]
    pub success_vision: String,
    #[serde(default)]
    pub stats: PhysicalStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_pattern: Option<EnergyPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_frequency: Option<ExerciseFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub exercise_types: Vec<ExerciseType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_schedule: Option<WorkSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_timing: Option<MealTimingPreference>,
    #[serde(default)]
    pub lifestyle_challenges: Vec<LifestyleChallenge>,
    #[serde(default)]
    pub eating_challenges: Vec<EatingChallenge>,
    #[serde(default)]
    pub dietary_restrictions: Vec<DietaryRestriction>,
    #[serde(default)]
    pub food_preferences: Vec<String>,
    #[serde(default)]
    pub weight_plan: WeightPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<LearningStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_level: Option<GuidanceLevel>,
    #[serde(default)]
    pub feature_preferences: Vec<FeaturePreference>,
    #[serde(default)]
    pub integration_preferences: Vec<IntegrationPreference>,
}

impl OnboardingSession {
    /// Whether any selected goal requires the weight-target screens.
    pub fn has_weight_goal(&self) -> bool {
        self.selected_goals.iter().any(|g| g.is_weight_related())
    }

    /// Apply a patch, overwriting the provided slices.
    ///
    /// Re-applying the same patch is a no-op; the wizard UI writes the
    /// current screen's slice every time before advancing.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(goals) = patch.selected_goals {
            self.selected_goals = goals;
            // A deselected goal cannot stay primary.
            if let Some(primary) = self.primary_goal {
                if !self.selected_goals.contains(&primary) {
                    self.primary_goal = None;
                }
            }
        }
        if let Some(goal) = patch.primary_goal {
            self.primary_goal = Some(goal);
        }
        if let Some(vision) = patch.success_vision {
            self.success_vision = vision;
        }
        if let Some(stats) = patch.stats {
            self.stats = stats;
        }
        if let Some(pattern) = patch.energy_pattern {
            self.energy_pattern = Some(pattern);
        }
        if let Some(frequency) = patch.exercise_frequency {
            self.exercise_frequency = Some(frequency);
        }
        if let Some(level) = patch.activity_level {
            self.activity_level = Some(level);
        }
        if let Some(types) = patch.exercise_types {
            self.exercise_types = types;
        }
        if let Some(schedule) = patch.work_schedule {
            self.work_schedule = Some(schedule);
        }
        if let Some(timing) = patch.meal_timing {
            self.meal_timing = Some(timing);
        }
        if let Some(challenges) = patch.lifestyle_challenges {
            self.lifestyle_challenges = challenges;
        }
        if let Some(challenges) = patch.eating_challenges {
            self.eating_challenges = challenges;
        }
        if let Some(restrictions) = patch.dietary_restrictions {
            self.dietary_restrictions = restrictions;
        }
        if let Some(preferences) = patch.food_preferences {
            self.food_preferences = preferences;
        }
        if let Some(plan) = patch.weight_plan {
            self.weight_plan = plan;
        }
        if let Some(style) = patch.learning_style {
            self.learning_style = Some(style);
        }
        if let Some(level) = patch.guidance_level {
            self.guidance_level = Some(level);
        }
        if let Some(features) = patch.feature_preferences {
            self.feature_preferences = features;
        }
        if let Some(integrations) = patch.integration_preferences {
            self.integration_preferences = integrations;
        }
    }
}

/// Partial session update sent by the client for the current screen.
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPatch {
    pub selected_goals: Option<Vec<HealthGoal>>,
    pub primary_goal: Option<HealthGoal>,
    pub success_vision: Option<String>,
    pub stats: Option<PhysicalStats>,
    pub energy_pattern: Option<EnergyPattern>,
    pub exercise_frequency: Option<ExerciseFrequency>,
    pub activity_level: Option<ActivityLevel>,
    pub exercise_types: Option<Vec<ExerciseType>>,
    pub work_schedule: Option<WorkSchedule>,
    pub meal_timing: Option<MealTimingPreference>,
    pub lifestyle_challenges: Option<Vec<LifestyleChallenge>>,
    pub eating_challenges: Option<Vec<EatingChallenge>>,
    pub dietary_restrictions: Option<Vec<DietaryRestriction>>,
    pub food_preferences: Option<Vec<String>>,
    pub weight_plan: Option<WeightPlan>,
    pub learning_style: Option<LearningStyle>,
    pub guidance_level: Option<GuidanceLevel>,
    pub feature_preferences: Option<Vec<FeaturePreference>>,
    pub integration_preferences: Option<Vec<IntegrationPreference>>,
}
