//! Meal analyzer — turns a photo or voice transcript into a nutrition
//! estimate via the LLM, with a one-question clarification sub-flow.
//!
//! The model either returns an estimate or asks exactly one clarifying
//! question (portion size, preparation, hidden ingredients). The client
//! shows the question, collects an answer, and re-submits the same input
//! with `clarification_answer` set.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{info, warn};

use crate::error::MealError;
use crate::llm::{ChatMessage, CompletionRequest, ImageData, LlmProvider, extract_json_object};

use super::model::{AnalysisOutcome, Clarification, MealAnalysis, MealInput, NutritionEstimate};

/// Configuration for meal analysis.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// LLM temperature for analysis.
    pub temperature: f32,
    /// Max tokens for the LLM response.
    pub max_tokens: u32,
    /// Cap on photo downloads, in bytes.
    pub max_photo_bytes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 768,
            max_photo_bytes: 8 * 1024 * 1024,
        }
    }
}

/// LLM-backed meal analyzer.
pub struct MealAnalyzer {
    llm: Arc<dyn LlmProvider>,
    http: reqwest::Client,
    config: AnalyzerConfig,
}

impl MealAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AnalyzerConfig) -> Self {
        Self {
            llm,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Analyze one meal input.
    pub async fn analyze(&self, input: &MealInput) -> Result<AnalysisOutcome, MealError> {
        if !input.has_content() {
            return Err(MealError::EmptyInput);
        }

        let image = self.resolve_photo(input).await?;

        info!(
            source = %input.source(),
            has_photo = image.is_some(),
            clarified = input.clarification_answer.is_some(),
            "Analyzing meal"
        );

        let system_prompt = "\
You are a nutritionist estimating the contents of a single meal.

Respond with a JSON object in one of two shapes:

If you can estimate with reasonable confidence:
{\"status\": \"estimate\", \"description\": \"short name of the meal\", \
\"calories\": number, \"protein_g\": number, \"carbs_g\": number, \"fat_g\": number, \
\"coach_note\": \"one encouraging, specific sentence\"}

If one missing detail would materially change the numbers (portion size, \
preparation, a hidden ingredient), ask for it instead — at most one question, \
with 2-4 short answer options:
{\"status\": \"needs_clarification\", \"question\": \"...\", \"options\": [\"...\"]}

If a clarification answer is provided in the input, do NOT ask again; produce \
your best estimate with it. ONLY output the JSON object.";

        let mut user_text = String::new();
        if let Some(transcript) = input.voice_transcript.as_deref() {
            user_text.push_str(&format!("The user said: \"{}\"\n", transcript.trim()));
        }
        if image.is_some() {
            user_text.push_str("A photo of the meal is attached.\n");
        }
        if let Some(answer) = input.clarification_answer.as_deref() {
            user_text.push_str(&format!("Clarification answer: \"{}\"\n", answer.trim()));
        }

        let mut user_msg = ChatMessage::user(user_text);
        if let Some(image) = image {
            user_msg = user_msg.with_image(image);
        }

        let request = CompletionRequest::new(vec![ChatMessage::system(system_prompt), user_msg])
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;
        parse_analysis(&response.content)
    }

    /// Produce the inline image for the request, fetching by URL if needed.
    async fn resolve_photo(&self, input: &MealInput) -> Result<Option<ImageData>, MealError> {
        if let Some(base64) = input.photo_base64.as_deref() {
            return Ok(Some(ImageData {
                base64: base64.to_string(),
                media_type: input
                    .photo_media_type
                    .clone()
                    .unwrap_or_else(|| "image/jpeg".to_string()),
            }));
        }

        let Some(url) = input.photo_url.as_deref() else {
            return Ok(None);
        };

        let response = self.http.get(url).send().await.map_err(|e| {
            MealError::PhotoFetch {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            return Err(MealError::PhotoFetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response.bytes().await.map_err(|e| MealError::PhotoFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if bytes.len() > self.config.max_photo_bytes {
            return Err(MealError::PhotoFetch {
                url: url.to_string(),
                reason: format!(
                    "photo is {} bytes, limit is {}",
                    bytes.len(),
                    self.config.max_photo_bytes
                ),
            });
        }

        Ok(Some(ImageData {
            base64: BASE64.encode(&bytes),
            media_type,
        }))
    }
}

/// Wire shape of the model's analysis response.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum RawAnalysis {
    Estimate {
        description: String,
        calories: f64,
        protein_g: f64,
        carbs_g: f64,
        fat_g: f64,
        #[serde(default)]
        coach_note: Option<String>,
    },
    NeedsClarification {
        question: String,
        #[serde(default)]
        options: Vec<String>,
    },
}

/// Parse and validate the model's JSON at the boundary.
fn parse_analysis(llm_response: &str) -> Result<AnalysisOutcome, MealError> {
    let json_str = extract_json_object(llm_response);
    let raw: RawAnalysis = serde_json::from_str(&json_str).map_err(|e| {
        warn!(error = %e, response = llm_response, "Failed to parse meal analysis JSON");
        MealError::InvalidResponse {
            reason: format!("not valid JSON: {e}"),
        }
    })?;

    match raw {
        RawAnalysis::Estimate {
            description,
            calories,
            protein_g,
            carbs_g,
            fat_g,
            coach_note,
        } => {
            if description.trim().is_empty() {
                return Err(MealError::InvalidResponse {
                    reason: "empty meal description".to_string(),
                });
            }
            if calories < 0.0 || protein_g < 0.0 || carbs_g < 0.0 || fat_g < 0.0 {
                return Err(MealError::InvalidResponse {
                    reason: "negative nutrition values".to_string(),
                });
            }
            Ok(AnalysisOutcome::Estimate(MealAnalysis {
                description,
                nutrition: NutritionEstimate {
                    calories,
                    protein_g,
                    carbs_g,
                    fat_g,
                },
                coach_note: coach_note.filter(|n| !n.trim().is_empty()),
            }))
        }
        RawAnalysis::NeedsClarification { question, options } => {
            if question.trim().is_empty() {
                return Err(MealError::InvalidResponse {
                    reason: "empty clarification question".to_string(),
                });
            }
            Ok(AnalysisOutcome::NeedsClarification(Clarification {
                question,
                options,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_estimate() {
        let response = r#"{"status": "estimate", "description": "Chicken burrito bowl",
            "calories": 780, "protein_g": 45, "carbs_g": 82, "fat_g": 28,
            "coach_note": "Solid protein — go easy on the sour cream next time."}"#;
        let outcome = parse_analysis(response).unwrap();
        match outcome {
            AnalysisOutcome::Estimate(analysis) => {
                assert_eq!(analysis.description, "Chicken burrito bowl");
                assert_eq!(analysis.nutrition.calories, 780.0);
                assert!(analysis.coach_note.is_some());
            }
            other => panic!("expected estimate, got {other:?}"),
        }
    }

    #[test]
    fn parse_clarification() {
        let response = r#"Sure, one question first:
```json
{"status": "needs_clarification", "question": "What size was the bowl?",
 "options": ["small", "regular", "large"]}
```"#;
        let outcome = parse_analysis(response).unwrap();
        match outcome {
            AnalysisOutcome::NeedsClarification(c) => {
                assert_eq!(c.question, "What size was the bowl?");
                assert_eq!(c.options.len(), 3);
            }
            other => panic!("expected clarification, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_negative_values() {
        let response = r#"{"status": "estimate", "description": "Mystery meal",
            "calories": -100, "protein_g": 0, "carbs_g": 0, "fat_g": 0}"#;
        assert!(matches!(
            parse_analysis(response),
            Err(MealError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn parse_rejects_prose() {
        assert!(matches!(
            parse_analysis("Looks like a tasty sandwich!"),
            Err(MealError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn blank_coach_note_dropped() {
        let response = r#"{"status": "estimate", "description": "Oatmeal",
            "calories": 320, "protein_g": 12, "carbs_g": 55, "fat_g": 6, "coach_note": "  "}"#;
        match parse_analysis(response).unwrap() {
            AnalysisOutcome::Estimate(analysis) => assert!(analysis.coach_note.is_none()),
            other => panic!("expected estimate, got {other:?}"),
        }
    }
}
