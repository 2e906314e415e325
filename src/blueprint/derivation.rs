//! Pure derivation of nutrition targets from a completed session.
//!
//! Calorie math follows Mifflin–St Jeor (1990) with the standard activity
//! factor table; goal adjustment scales the maintenance estimate toward the
//! user's primary goal.

use chrono::Utc;

use crate::error::BlueprintError;
use crate::onboarding::model::{
    ActivityLevel, BiologicalSex, HealthGoal, PhysicalStats, UserProfile,
};
use crate::onboarding::session::OnboardingSession;

use super::model::{Blueprint, MacroTargets};

/// Mifflin–St Jeor sex constant. The neutral value for other/unspecified is
/// the mean of the male (+5) and female (−161) constants.
fn sex_constant(sex: BiologicalSex) -> f64 {
    match sex {
        BiologicalSex::Male => 5.0,
        BiologicalSex::Female => -161.0,
        BiologicalSex::Other => -78.0,
    }
}

/// TDEE multiplier per activity level.
pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtraActive => 1.9,
    }
}

/// Calorie adjustment toward the primary goal, applied to TDEE.
pub fn goal_adjustment(goal: Option<HealthGoal>) -> f64 {
    match goal {
        Some(HealthGoal::LoseWeight) => 0.8,
        Some(HealthGoal::GainWeight) => 1.2,
        Some(HealthGoal::BuildMuscle) => 1.1,
        _ => 1.0,
    }
}

/// Basal metabolic rate (kcal/day).
///
/// `None` when height, weight, age, or sex is missing — a target is absent,
/// never zero.
pub fn bmr(stats: &PhysicalStats) -> Option<f64> {
    let height = stats.height_cm.filter(|h| *h > 0.0)?;
    let weight = stats.weight_kg.filter(|w| *w > 0.0)?;
    let age = stats.age_years.filter(|a| *a > 0)?;
    let sex = stats.sex?;
    Some(10.0 * weight + 6.25 * height - 5.0 * f64::from(age) + sex_constant(sex))
}

/// Goal-adjusted daily calorie target (kcal).
///
/// An unset activity level falls back to the sedentary multiplier, the most
/// conservative estimate; in practice the activity gate guarantees it is set
/// before this runs.
pub fn calorie_target(
    stats: &PhysicalStats,
    activity: Option<ActivityLevel>,
    primary_goal: Option<HealthGoal>,
) -> Option<f64> {
    let bmr = bmr(stats)?;
    let tdee = bmr * activity_multiplier(activity.unwrap_or(ActivityLevel::Sedentary));
    Some(tdee * goal_adjustment(primary_goal))
}

/// Macro split as a percentage of the calorie target, by primary goal.
/// Grams via 4 kcal/g protein and carbs, 9 kcal/g fat.
pub fn macro_targets(calories: f64, primary_goal: Option<HealthGoal>) -> MacroTargets {
    let (protein_pct, carbs_pct, fat_pct) = match primary_goal {
        Some(HealthGoal::BuildMuscle) => (0.35, 0.35, 0.30),
        Some(HealthGoal::LoseWeight) => (0.35, 0.30, 0.35),
        _ => (0.30, 0.40, 0.30),
    };
    MacroTargets {
        protein_g: ((calories * protein_pct) / 4.0).round() as u32,
        carbs_g: ((calories * carbs_pct) / 4.0).round() as u32,
        fat_g: ((calories * fat_pct) / 9.0).round() as u32,
    }
}

/// Canned success-vision suggestions shown on the vision screen.
///
/// Total over the goal enum: every goal maps to exactly three prompts.
pub fn vision_suggestions(goal: HealthGoal) -> [&'static str; 3] {
    match goal {
        HealthGoal::LoseWeight => [
            "I fit comfortably into clothes I stopped wearing",
            "I step on the scale without dreading the number",
            "I keep my portions in check without counting every bite",
        ],
        HealthGoal::GainWeight => [
            "I finish every meal without forcing it",
            "I see the scale trend up a little each week",
            "People notice I look stronger and healthier",
        ],
        HealthGoal::BuildMuscle => [
            "I hit a new personal best in the gym",
            "I eat enough protein every day without thinking about it",
            "My progress photos show visible definition",
        ],
        HealthGoal::EatHealthier => [
            "I cook at home most nights of the week",
            "Vegetables show up on my plate at every meal",
            "I stop eating when I'm satisfied, not stuffed",
        ],
        HealthGoal::BoostEnergy => [
            "I get through the afternoon without a crash",
            "I wake up feeling rested and ready",
            "I stop relying on caffeine to stay sharp",
        ],
        HealthGoal::ImproveDigestion => [
            "I finish meals without bloating or discomfort",
            "I know which foods my body handles well",
            "My digestion feels predictable day to day",
        ],
        HealthGoal::SleepBetter => [
            "I stop eating heavy meals right before bed",
            "I fall asleep within minutes of lying down",
            "I wake up without an alarm on weekends",
        ],
        HealthGoal::BuildHabits => [
            "Logging my meals is automatic, not a chore",
            "I have a routine I actually stick to",
            "One bad day doesn't derail my whole week",
        ],
    }
}

/// Derive the numeric half of the blueprint from a session.
///
/// Errors name the missing answers so the caller can report exactly what is
/// incomplete — by construction the wizard cannot reach generation in that
/// state, so this guards against direct API use.
pub fn derive_targets(session: &OnboardingSession) -> Result<(u32, MacroTargets), BlueprintError> {
    let calories = calorie_target(
        &session.stats,
        session.activity_level,
        session.primary_goal,
    )
    .ok_or_else(|| BlueprintError::IncompleteSession {
        missing: "height, weight, age, and biological sex".to_string(),
    })?;
    let macros = macro_targets(calories, session.primary_goal);
    Ok((calories.round() as u32, macros))
}

/// Assemble the persisted profile from a finished session.
pub fn build_profile(session: &OnboardingSession, blueprint: Option<Blueprint>) -> UserProfile {
    UserProfile {
        goals: session.selected_goals.clone(),
        primary_goal: session.primary_goal,
        success_vision: session.success_vision.trim().to_string(),
        stats: session.stats.clone(),
        energy_pattern: session.energy_pattern,
        exercise_frequency: session.exercise_frequency,
        activity_level: session.activity_level,
        exercise_types: session.exercise_types.clone(),
        work_schedule: session.work_schedule,
        meal_timing: session.meal_timing,
        lifestyle_challenges: session.lifestyle_challenges.clone(),
        eating_challenges: session.eating_challenges.clone(),
        dietary_restrictions: session.dietary_restrictions.clone(),
        food_preferences: session.food_preferences.clone(),
        weight_plan: session.weight_plan.clone(),
        learning_style: session.learning_style,
        guidance_level: session.guidance_level,
        feature_preferences: session.feature_preferences.clone(),
        integration_preferences: session.integration_preferences.clone(),
        blueprint,
        onboarding_completed: false,
        onboarding_completed_at: None,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::UnitSystem;

    fn stats(sex: BiologicalSex) -> PhysicalStats {
        PhysicalStats {
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
            age_years: Some(30),
            sex: Some(sex),
            unit_system: UnitSystem::Metric,
        }
    }

    #[test]
    fn bmr_male_reference_case() {
        // 10*70 + 6.25*175 - 5*30 + 5
        let value = bmr(&stats(BiologicalSex::Male)).unwrap();
        assert!((value - 1648.75).abs() < 1e-9);
    }

    #[test]
    fn bmr_is_sex_specific() {
        let male = bmr(&stats(BiologicalSex::Male)).unwrap();
        let female = bmr(&stats(BiologicalSex::Female)).unwrap();
        let other = bmr(&stats(BiologicalSex::Other)).unwrap();
        assert!((male - female - 166.0).abs() < 1e-9);
        // Neutral constant sits exactly between the two.
        assert!((other - (male + female) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn bmr_absent_when_any_field_missing() {
        let mut s = stats(BiologicalSex::Male);
        s.age_years = None;
        assert!(bmr(&s).is_none());

        let mut s = stats(BiologicalSex::Male);
        s.weight_kg = Some(0.0);
        assert!(bmr(&s).is_none());

        let mut s = stats(BiologicalSex::Male);
        s.sex = None;
        assert!(bmr(&s).is_none());
    }

    #[test]
    fn calorie_target_moderate_weight_loss_case() {
        // BMR 1648.75 * 1.55 * 0.8
        let target = calorie_target(
            &stats(BiologicalSex::Male),
            Some(ActivityLevel::ModeratelyActive),
            Some(HealthGoal::LoseWeight),
        )
        .unwrap();
        assert!((target - 2044.45).abs() < 0.5);
    }

    #[test]
    fn calorie_target_absent_without_stats() {
        let target = calorie_target(
            &PhysicalStats::default(),
            Some(ActivityLevel::VeryActive),
            Some(HealthGoal::GainWeight),
        );
        assert!(target.is_none());
    }

    #[test]
    fn activity_multiplier_table() {
        assert_eq!(activity_multiplier(ActivityLevel::Sedentary), 1.2);
        assert_eq!(activity_multiplier(ActivityLevel::LightlyActive), 1.375);
        assert_eq!(activity_multiplier(ActivityLevel::ModeratelyActive), 1.55);
        assert_eq!(activity_multiplier(ActivityLevel::VeryActive), 1.725);
        assert_eq!(activity_multiplier(ActivityLevel::ExtraActive), 1.9);
    }

    #[test]
    fn goal_adjustment_table() {
        assert_eq!(goal_adjustment(Some(HealthGoal::LoseWeight)), 0.8);
        assert_eq!(goal_adjustment(Some(HealthGoal::GainWeight)), 1.2);
        assert_eq!(goal_adjustment(Some(HealthGoal::BuildMuscle)), 1.1);
        assert_eq!(goal_adjustment(Some(HealthGoal::SleepBetter)), 1.0);
        assert_eq!(goal_adjustment(None), 1.0);
    }

    #[test]
    fn macro_grams_add_back_up_to_calories() {
        let calories = 2000.0;
        for goal in [
            None,
            Some(HealthGoal::LoseWeight),
            Some(HealthGoal::BuildMuscle),
        ] {
            let m = macro_targets(calories, goal);
            let kcal =
                f64::from(m.protein_g) * 4.0 + f64::from(m.carbs_g) * 4.0 + f64::from(m.fat_g) * 9.0;
            // Rounding each macro independently drifts a few kcal at most.
            assert!(
                (kcal - calories).abs() < 15.0,
                "{goal:?}: {kcal} vs {calories}"
            );
        }
    }

    #[test]
    fn vision_suggestions_total_over_goal_enum() {
        for goal in HealthGoal::ALL {
            let suggestions = vision_suggestions(goal);
            assert_eq!(suggestions.len(), 3);
            for s in suggestions {
                assert!(!s.trim().is_empty(), "{goal} has an empty suggestion");
            }
        }
    }

    #[test]
    fn derive_targets_requires_complete_stats() {
        let session = OnboardingSession::default();
        assert!(matches!(
            derive_targets(&session),
            Err(BlueprintError::IncompleteSession { .. })
        ));
    }

    #[test]
    fn full_session_yields_profile_with_targets() {
        let mut session = OnboardingSession::default();
        session.selected_goals = vec![HealthGoal::LoseWeight, HealthGoal::BoostEnergy];
        session.primary_goal = Some(HealthGoal::LoseWeight);
        session.success_vision = "  run a 10k with my kids  ".to_string();
        session.stats = stats(BiologicalSex::Female);
        session.activity_level = Some(ActivityLevel::LightlyActive);

        let (calories, macros) = derive_targets(&session).unwrap();
        let profile = build_profile(
            &session,
            Some(Blueprint {
                calorie_target: calories,
                macros,
                timing_windows: vec![],
                advice: vec![],
                supplements: vec![],
            }),
        );

        let blueprint = profile.blueprint.expect("blueprint present");
        assert!(blueprint.calorie_target > 0);
        assert!(blueprint.macros.protein_g > 0);
        assert_eq!(profile.success_vision, "run a 10k with my kids");
        assert!(!profile.onboarding_completed);
    }
}
