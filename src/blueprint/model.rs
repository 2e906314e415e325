//! Blueprint value objects.

use serde::{Deserialize, Serialize};

/// Daily macro targets in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fat_g: u32,
}

/// A named meal-timing window, e.g. "Breakfast" / "7:00–8:30am".
/// The window text is free-form; the client renders it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindow {
    pub name: String,
    pub window: String,
}

/// The derived nutrition plan revealed at the end of onboarding.
///
/// Computed once from a completed session; never partially computed — the
/// wizard cannot reach the generation screen with gating answers missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Daily calorie target (kcal).
    pub calorie_target: u32,
    pub macros: MacroTargets,
    #[serde(default)]
    pub timing_windows: Vec<TimingWindow>,
    #[serde(default)]
    pub advice: Vec<String>,
    #[serde(default)]
    pub supplements: Vec<String>,
}
