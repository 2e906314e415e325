//! Meal logging — photo/voice/manual entries, AI nutrition analysis, and
//! daily progress against the profile's targets.

pub mod analyzer;
pub mod model;
pub mod routes;

pub use analyzer::{AnalyzerConfig, MealAnalyzer};
pub use model::{
    AnalysisOutcome, Clarification, MealAnalysis, MealInput, MealRecord, MealSource,
    NutritionEstimate,
};
pub use routes::{MealRouteState, meal_routes};
