//! The wizard's screen sequence and per-screen gating rules.
//!
//! Screens are a fixed linear sequence, indexed 1-based to match what the
//! client renders in its progress bar. Each screen owns a disjoint slice of
//! the session and a completion predicate that must hold before the wizard
//! may advance past it.

use serde::{Deserialize, Serialize};

use super::session::OnboardingSession;

/// One screen of the onboarding wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Splash,
    Welcome,
    GoalSelect,
    PrimaryGoal,
    Vision,
    BodyBasics,
    EnergyPattern,
    Activity,
    Lifestyle,
    EatingChallenges,
    DietaryRestrictions,
    FoodPreferences,
    WeightGoal,
    WeightPace,
    LearningStyle,
    GuidanceLevel,
    FeaturePreferences,
    Integrations,
    Recap,
    GeneratingBlueprint,
    BlueprintReveal,
    Finish,
}

impl Screen {
    /// Every screen in wizard order.
    pub const ALL: [Screen; 22] = [
        Screen::Splash,
        Screen::Welcome,
        Screen::GoalSelect,
        Screen::PrimaryGoal,
        Screen::Vision,
        Screen::BodyBasics,
        Screen::EnergyPattern,
        Screen::Activity,
        Screen::Lifestyle,
        Screen::EatingChallenges,
        Screen::DietaryRestrictions,
        Screen::FoodPreferences,
        Screen::WeightGoal,
        Screen::WeightPace,
        Screen::LearningStyle,
        Screen::GuidanceLevel,
        Screen::FeaturePreferences,
        Screen::Integrations,
        Screen::Recap,
        Screen::GeneratingBlueprint,
        Screen::BlueprintReveal,
        Screen::Finish,
    ];

    /// Total number of screens.
    pub const TOTAL: u8 = Self::ALL.len() as u8;

    /// 1-based position in the wizard.
    pub fn index(self) -> u8 {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .map(|p| p as u8 + 1)
            .unwrap_or(1)
    }

    /// Screen at a 1-based index.
    pub fn from_index(index: u8) -> Option<Screen> {
        if index == 0 {
            return None;
        }
        Self::ALL.get(usize::from(index) - 1).copied()
    }

    /// Next screen in the sequence, if any.
    pub fn next(self) -> Option<Screen> {
        Self::from_index(self.index() + 1)
    }

    /// Previous screen in the sequence, if any.
    pub fn prev(self) -> Option<Screen> {
        self.index().checked_sub(1).and_then(Screen::from_index)
    }

    /// Whether this screen advances on its own after a fixed delay,
    /// independent of user input.
    pub fn auto_advances(self) -> bool {
        self == Screen::Splash
    }

    /// Whether this screen belongs to the weight-target branch, shown only
    /// when a weight-related goal was selected.
    pub fn in_weight_branch(self) -> bool {
        matches!(self, Screen::WeightGoal | Screen::WeightPace)
    }

    /// Completion predicate: may the wizard advance past this screen?
    ///
    /// Pure over the session; never errors. Screens without a rule are
    /// permissive.
    pub fn can_proceed(self, session: &OnboardingSession) -> bool {
        match self {
            Screen::GoalSelect => (2..=4).contains(&session.selected_goals.len()),
            Screen::PrimaryGoal => session
                .primary_goal
                .is_some_and(|g| session.selected_goals.contains(&g)),
            Screen::Vision => !session.success_vision.trim().is_empty(),
            Screen::BodyBasics => session.stats.is_complete(),
            Screen::EnergyPattern => session.energy_pattern.is_some(),
            Screen::Activity => {
                session.exercise_frequency.is_some() && session.activity_level.is_some()
            }
            Screen::Lifestyle => session.work_schedule.is_some() && session.meal_timing.is_some(),
            _ => true,
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Splash => "splash",
            Self::Welcome => "welcome",
            Self::GoalSelect => "goal_select",
            Self::PrimaryGoal => "primary_goal",
            Self::Vision => "vision",
            Self::BodyBasics => "body_basics",
            Self::EnergyPattern => "energy_pattern",
            Self::Activity => "activity",
            Self::Lifestyle => "lifestyle",
            Self::EatingChallenges => "eating_challenges",
            Self::DietaryRestrictions => "dietary_restrictions",
            Self::FoodPreferences => "food_preferences",
            Self::WeightGoal => "weight_goal",
            Self::WeightPace => "weight_pace",
            Self::LearningStyle => "learning_style",
            Self::GuidanceLevel => "guidance_level",
            Self::FeaturePreferences => "feature_preferences",
            Self::Integrations => "integrations",
            Self::Recap => "recap",
            Self::GeneratingBlueprint => "generating_blueprint",
            Self::BlueprintReveal => "blueprint_reveal",
            Self::Finish => "finish",
        };
        write!(f, "{s}")
    }
}
