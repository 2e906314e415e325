//! Meal log data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a meal entry was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSource {
    Photo,
    Voice,
    Manual,
}

impl std::fmt::Display for MealSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Photo => "photo",
            Self::Voice => "voice",
            Self::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

/// Estimated nutrition for one meal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl NutritionEstimate {
    /// Element-wise sum, used for daily totals.
    pub fn add(&self, other: &NutritionEstimate) -> NutritionEstimate {
        NutritionEstimate {
            calories: self.calories + other.calories,
            protein_g: self.protein_g + other.protein_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fat_g: self.fat_g + other.fat_g,
        }
    }
}

/// A persisted meal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: Uuid,
    pub logged_at: DateTime<Utc>,
    pub source: MealSource,
    pub description: String,
    pub nutrition: NutritionEstimate,
    /// One-line coaching remark from the analysis, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_note: Option<String>,
}

impl MealRecord {
    pub fn new(
        source: MealSource,
        description: impl Into<String>,
        nutrition: NutritionEstimate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            logged_at: Utc::now(),
            source,
            description: description.into(),
            nutrition,
            coach_note: None,
        }
    }

    pub fn with_coach_note(mut self, note: impl Into<String>) -> Self {
        self.coach_note = Some(note.into());
        self
    }
}

/// Input to the analyzer: a photo (inline or by URL), a voice transcript,
/// or both, plus the user's answer when re-running after a clarification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealInput {
    /// Base64-encoded photo bytes.
    pub photo_base64: Option<String>,
    /// MIME type of the inline photo; defaults to `image/jpeg`.
    pub photo_media_type: Option<String>,
    /// Photo by URL; fetched server-side.
    pub photo_url: Option<String>,
    /// Transcribed voice description of the meal.
    pub voice_transcript: Option<String>,
    /// The user's answer to a previous clarification question.
    pub clarification_answer: Option<String>,
}

impl MealInput {
    /// Whether any analyzable content is present.
    pub fn has_content(&self) -> bool {
        self.photo_base64.is_some() || self.photo_url.is_some() || self.voice_transcript.is_some()
    }

    /// Source tag for the resulting record.
    pub fn source(&self) -> MealSource {
        if self.photo_base64.is_some() || self.photo_url.is_some() {
            MealSource::Photo
        } else {
            MealSource::Voice
        }
    }
}

/// A successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub description: String,
    pub nutrition: NutritionEstimate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_note: Option<String>,
}

/// The model needs one more answer before it can estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Result of one analysis call: either an estimate or a clarification
/// request the client answers and re-submits.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Estimate(MealAnalysis),
    NeedsClarification(Clarification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nutrition_totals_add_up() {
        let breakfast = NutritionEstimate {
            calories: 420.0,
            protein_g: 25.0,
            carbs_g: 40.0,
            fat_g: 16.0,
        };
        let lunch = NutritionEstimate {
            calories: 650.0,
            protein_g: 38.0,
            carbs_g: 55.0,
            fat_g: 28.0,
        };
        let total = breakfast.add(&lunch);
        assert_eq!(total.calories, 1070.0);
        assert_eq!(total.protein_g, 63.0);
    }

    #[test]
    fn input_source_prefers_photo() {
        let input = MealInput {
            photo_url: Some("https://example.com/meal.jpg".to_string()),
            voice_transcript: Some("chicken salad".to_string()),
            ..Default::default()
        };
        assert_eq!(input.source(), MealSource::Photo);

        let input = MealInput {
            voice_transcript: Some("chicken salad".to_string()),
            ..Default::default()
        };
        assert_eq!(input.source(), MealSource::Voice);
    }

    #[test]
    fn empty_input_has_no_content() {
        assert!(!MealInput::default().has_content());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = AnalysisOutcome::NeedsClarification(Clarification {
            question: "What size was the bowl?".to_string(),
            options: vec!["small".to_string(), "large".to_string()],
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "needs_clarification");
        assert_eq!(json["question"], "What size was the bowl?");
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = MealRecord::new(
            MealSource::Photo,
            "Grilled salmon with rice",
            NutritionEstimate {
                calories: 580.0,
                protein_g: 42.0,
                carbs_g: 48.0,
                fat_g: 22.0,
            },
        )
        .with_coach_note("Nice protein hit — consider adding greens.");

        let json = serde_json::to_string(&record).unwrap();
        let parsed: MealRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
