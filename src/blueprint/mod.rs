//! Health blueprint — derived nutrition targets and coaching content.
//!
//! The numeric targets (calories, macros) are computed deterministically
//! from the finished onboarding session; the qualitative content (meal
//! timing windows, advice, supplements) comes from the AI collaborator and
//! is validated at the boundary.

pub mod derivation;
pub mod generator;
pub mod model;

pub use generator::{BlueprintGenerator, GeneratorConfig, LlmBlueprintGenerator};
pub use model::{Blueprint, MacroTargets, TimingWindow};
