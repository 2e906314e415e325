//! Blueprint generator — asks the LLM for the qualitative half of the plan.
//!
//! The calorie and macro numbers are derived locally (`derivation`); the
//! model fills in meal-timing windows, advice, and an optional supplement
//! list, tailored to the session answers. The model response is opaque JSON
//! validated here at the boundary.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::BlueprintError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, extract_json_object};
use crate::onboarding::session::OnboardingSession;

use super::derivation::derive_targets;
use super::model::{Blueprint, TimingWindow};

/// Produces a blueprint from a completed session over an async channel.
/// One-shot: no retries here — the caller surfaces failure and lets the
/// user retry.
#[async_trait]
pub trait BlueprintGenerator: Send + Sync {
    async fn generate(&self, session: &OnboardingSession) -> Result<Blueprint, BlueprintError>;
}

/// Configuration for blueprint generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// LLM temperature for plan generation.
    pub temperature: f32,
    /// Max tokens for the LLM response.
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 1024,
        }
    }
}

/// LLM-backed blueprint generator.
pub struct LlmBlueprintGenerator {
    llm: Arc<dyn LlmProvider>,
    config: GeneratorConfig,
}

impl LlmBlueprintGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GeneratorConfig) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl BlueprintGenerator for LlmBlueprintGenerator {
    async fn generate(&self, session: &OnboardingSession) -> Result<Blueprint, BlueprintError> {
        let (calorie_target, macros) = derive_targets(session)?;

        info!(
            calorie_target = calorie_target,
            model = self.llm.model_name(),
            "Generating blueprint"
        );

        let system_prompt = "\
You are a nutrition coach generating a personal plan from a user's onboarding answers.

Respond with a JSON object with exactly these fields:
- \"timing_windows\": array of {\"name\": string, \"window\": string} — 3-5 named eating \
windows fitted to the user's schedule and meal-timing preference (e.g. {\"name\": \"Breakfast\", \
\"window\": \"7:00-8:30am\"})\n\
- \"advice\": array of 3-6 short, specific coaching tips grounded in the user's goals, \
challenges, and restrictions\n\
- \"supplements\": array of strings, possibly empty — only widely accepted basics, never \
prescription suggestions\n\n\
ONLY output the JSON object. No other text.";

        let user_prompt = format!(
            "{}\n\nDaily targets already computed: {calorie_target} kcal, \
             {}g protein / {}g carbs / {}g fat.",
            summarize_session(session),
            macros.protein_g,
            macros.carbs_g,
            macros.fat_g,
        );

        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;

        let fields = parse_plan_fields(&response.content)?;

        Ok(Blueprint {
            calorie_target,
            macros,
            timing_windows: fields.timing_windows,
            advice: fields.advice,
            supplements: fields.supplements,
        })
    }
}

/// The model-supplied half of the blueprint.
#[derive(Debug, serde::Deserialize)]
struct PlanFields {
    #[serde(default)]
    timing_windows: Vec<TimingWindow>,
    #[serde(default)]
    advice: Vec<String>,
    #[serde(default)]
    supplements: Vec<String>,
}

/// Parse and validate the model's JSON. Advice is required; a plan with no
/// coaching content is unusable.
fn parse_plan_fields(llm_response: &str) -> Result<PlanFields, BlueprintError> {
    let json_str = extract_json_object(llm_response);
    let fields: PlanFields = serde_json::from_str(&json_str).map_err(|e| {
        warn!(error = %e, response = llm_response, "Failed to parse blueprint JSON");
        BlueprintError::InvalidResponse {
            reason: format!("not valid JSON: {e}"),
        }
    })?;

    if fields.advice.iter().all(|a| a.trim().is_empty()) {
        return Err(BlueprintError::InvalidResponse {
            reason: "no advice in response".to_string(),
        });
    }
    Ok(fields)
}

/// Render the session as prompt context.
fn summarize_session(session: &OnboardingSession) -> String {
    let mut parts = vec![format!(
        "Goals: {}",
        session
            .selected_goals
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )];

    if let Some(primary) = session.primary_goal {
        parts.push(format!("Primary goal: {primary}"));
    }
    if !session.success_vision.trim().is_empty() {
        parts.push(format!("Their vision: \"{}\"", session.success_vision.trim()));
    }
    if let Some(pattern) = session.energy_pattern {
        parts.push(format!("Energy pattern: {}", json_name(&pattern)));
    }
    if let Some(level) = session.activity_level {
        parts.push(format!("Activity level: {}", json_name(&level)));
    }
    if let Some(timing) = session.meal_timing {
        parts.push(format!("Meal timing preference: {}", json_name(&timing)));
    }
    if let Some(schedule) = session.work_schedule {
        parts.push(format!("Work schedule: {}", json_name(&schedule)));
    }
    if !session.eating_challenges.is_empty() {
        parts.push(format!(
            "Eating challenges: {}",
            join_names(&session.eating_challenges)
        ));
    }
    if !session.dietary_restrictions.is_empty() {
        parts.push(format!(
            "Dietary restrictions: {}",
            join_names(&session.dietary_restrictions)
        ));
    }
    if !session.lifestyle_challenges.is_empty() {
        parts.push(format!(
            "Lifestyle: {}",
            join_names(&session.lifestyle_challenges)
        ));
    }

    parts.join("\n")
}

/// Snake_case wire name of a serde enum value.
fn json_name<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

fn join_names<T: serde::Serialize>(values: &[T]) -> String {
    values.iter().map(json_name).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{EatingChallenge, HealthGoal};

    #[test]
    fn parse_rejects_non_json() {
        let result = parse_plan_fields("I can't help with that.");
        assert!(matches!(
            result,
            Err(BlueprintError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn parse_rejects_empty_advice() {
        let result = parse_plan_fields(r#"{"timing_windows": [], "advice": ["  "]}"#);
        assert!(matches!(
            result,
            Err(BlueprintError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn parse_accepts_minimal_plan() {
        let fields =
            parse_plan_fields(r#"{"advice": ["Front-load protein at breakfast."]}"#).unwrap();
        assert_eq!(fields.advice.len(), 1);
        assert!(fields.timing_windows.is_empty());
        assert!(fields.supplements.is_empty());
    }

    #[test]
    fn summary_includes_key_answers() {
        let mut session = OnboardingSession::default();
        session.selected_goals = vec![HealthGoal::LoseWeight, HealthGoal::BoostEnergy];
        session.primary_goal = Some(HealthGoal::LoseWeight);
        session.success_vision = "feel at home in my body".to_string();
        session.eating_challenges = vec![EatingChallenge::LateNightEating];

        let summary = summarize_session(&session);
        assert!(summary.contains("lose_weight"));
        assert!(summary.contains("feel at home in my body"));
        assert!(summary.contains("late_night_eating"));
    }
}
