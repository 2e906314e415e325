//! User profile and onboarding answer models.
//!
//! All answer enums are closed: the wire format is snake_case serde with a
//! matching `Display`, same as everything else the mobile client exchanges
//! with us.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blueprint::model::Blueprint;

/// A health goal the user can select during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoal {
    LoseWeight,
    GainWeight,
    BuildMuscle,
    EatHealthier,
    BoostEnergy,
    ImproveDigestion,
    SleepBetter,
    BuildHabits,
}

impl HealthGoal {
    /// Every goal, in display order.
    pub const ALL: [HealthGoal; 8] = [
        HealthGoal::LoseWeight,
        HealthGoal::GainWeight,
        HealthGoal::BuildMuscle,
        HealthGoal::EatHealthier,
        HealthGoal::BoostEnergy,
        HealthGoal::ImproveDigestion,
        HealthGoal::SleepBetter,
        HealthGoal::BuildHabits,
    ];

    /// Whether this goal drives the weight-target screens of the wizard.
    pub fn is_weight_related(self) -> bool {
        matches!(self, HealthGoal::LoseWeight | HealthGoal::GainWeight)
    }
}

impl std::fmt::Display for HealthGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::LoseWeight => "lose_weight",
            Self::GainWeight => "gain_weight",
            Self::BuildMuscle => "build_muscle",
            Self::EatHealthier => "eat_healthier",
            Self::BoostEnergy => "boost_energy",
            Self::ImproveDigestion => "improve_digestion",
            Self::SleepBetter => "sleep_better",
            Self::BuildHabits => "build_habits",
        };
        write!(f, "{s}")
    }
}

/// Biological sex, used only for the BMR constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    Male,
    Female,
    Other,
}

/// Unit system the client displays in. Stats are stored metric regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Height/weight/age/sex collected on the body-basics screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalStats {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age_years: Option<u32>,
    pub sex: Option<BiologicalSex>,
    #[serde(default)]
    pub unit_system: UnitSystem,
}

impl PhysicalStats {
    /// All four gating fields populated and positive.
    pub fn is_complete(&self) -> bool {
        self.height_cm.is_some_and(|h| h > 0.0)
            && self.weight_kg.is_some_and(|w| w > 0.0)
            && self.age_years.is_some_and(|a| a > 0)
            && self.sex.is_some()
    }
}

/// When the user's energy typically peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyPattern {
    MorningPeak,
    AfternoonPeak,
    EveningPeak,
    SteadyAllDay,
    UpAndDown,
}

/// How often the user exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseFrequency {
    Never,
    OneToTwoPerWeek,
    ThreeToFourPerWeek,
    FivePlusPerWeek,
}

/// Overall activity level, mapped to a TDEE multiplier during derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Cardio,
    Strength,
    Yoga,
    Sports,
    Walking,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkSchedule {
    Standard,
    Shift,
    Flexible,
    NotWorking,
}

/// Preferred meal cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealTimingPreference {
    ThreeMeals,
    SmallFrequent,
    IntermittentFasting,
    Irregular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifestyleChallenge {
    BusySchedule,
    FrequentTravel,
    FamilyMeals,
    LateNights,
    DeskJob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EatingChallenge {
    Snacking,
    PortionControl,
    SugarCravings,
    EmotionalEating,
    EatingOut,
    LateNightEating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    Halal,
    Kosher,
    NutAllergy,
}

/// Target weight and pace, collected only when a weight goal is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightPlan {
    pub target_weight_kg: Option<f64>,
    pub weekly_rate_kg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    HandsOn,
    Reading,
    Audio,
}

/// How much coaching the user wants from the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceLevel {
    HighTouch,
    Balanced,
    LightTouch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePreference {
    PhotoLogging,
    VoiceLogging,
    Reminders,
    Insights,
    MealPlanning,
    ProgressCharts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationPreference {
    AppleHealth,
    GoogleFit,
    Fitbit,
    Garmin,
}

/// User profile built from a finished onboarding session.
///
/// Persisted as a JSON blob keyed by user id; saves are idempotent upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub goals: Vec<HealthGoal>,
    pub primary_goal: Option<HealthGoal>,
    pub success_vision: String,
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
    /// Derived nutrition targets. Present once the blueprint screen is reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<Blueprint>,
    pub onboarding_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Default user ID (single-user backend, one device per install).
pub const DEFAULT_USER: &str = "default";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_related_goals() {
        assert!(HealthGoal::LoseWeight.is_weight_related());
        assert!(HealthGoal::GainWeight.is_weight_related());
        assert!(!HealthGoal::BuildMuscle.is_weight_related());
        assert!(!HealthGoal::EatHealthier.is_weight_related());
    }

    #[test]
    fn display_matches_serde_for_goals() {
        for goal in HealthGoal::ALL {
            let display = format!("{goal}");
            let json = serde_json::to_string(&goal).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }

    #[test]
    fn stats_completeness() {
        let mut stats = PhysicalStats::default();
        assert!(!stats.is_complete());

        stats.height_cm = Some(175.0);
        stats.weight_kg = Some(70.0);
        stats.age_years = Some(30);
        assert!(!stats.is_complete(), "sex still missing");

        stats.sex = Some(BiologicalSex::Female);
        assert!(stats.is_complete());
    }

    #[test]
    fn stats_reject_zero_values() {
        let stats = PhysicalStats {
            height_cm: Some(0.0),
            weight_kg: Some(70.0),
            age_years: Some(30),
            sex: Some(BiologicalSex::Male),
            unit_system: UnitSystem::Metric,
        };
        assert!(!stats.is_complete());
    }

    #[test]
    fn goal_serde_roundtrip() {
        let goals = vec![HealthGoal::LoseWeight, HealthGoal::SleepBetter];
        let json = serde_json::to_string(&goals).unwrap();
        assert_eq!(json, r#"["lose_weight","sleep_better"]"#);
        let parsed: Vec<HealthGoal> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, goals);
    }
}
