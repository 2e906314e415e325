//! Bridges rig-core's `CompletionModel` trait to our `LlmProvider` trait.

use async_trait::async_trait;

use rig::OneOrMany;
use rig::completion::CompletionModel;
use rig::message::{
    AssistantContent, DocumentSourceKind, Image, ImageMediaType, Message, UserContent,
};

use crate::error::LlmError;

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, ImageData, LlmProvider, Role,
};

/// Adapter wrapping a rig `CompletionModel`.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

/// Convert one of our user/assistant messages into a rig message.
fn to_rig_message(msg: &ChatMessage) -> Result<Message, LlmError> {
    match msg.role {
        Role::Assistant => Ok(Message::assistant(&msg.content)),
        // System messages are handled via the preamble, not the history.
        Role::System | Role::User => {
            if msg.images.is_empty() {
                return Ok(Message::user(&msg.content));
            }
            let mut content = vec![UserContent::text(&msg.content)];
            for image in &msg.images {
                content.push(to_rig_image(image));
            }
            let content = OneOrMany::many(content).map_err(|e| LlmError::RequestFailed {
                provider: "rig".to_string(),
                reason: format!("Failed to build message content: {e}"),
            })?;
            Ok(Message::User { content })
        }
    }
}

fn to_rig_image(image: &ImageData) -> UserContent {
    let media_type = match image.media_type.as_str() {
        "image/png" => Some(ImageMediaType::PNG),
        "image/gif" => Some(ImageMediaType::GIF),
        "image/webp" => Some(ImageMediaType::WEBP),
        _ => Some(ImageMediaType::JPEG),
    };
    UserContent::Image(Image {
        data: DocumentSourceKind::Base64(image.base64.clone()),
        media_type,
        detail: None,
        additional_params: None,
    })
}

#[async_trait]
impl<M: CompletionModel> LlmProvider for RigAdapter<M> {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // Fold system messages into the preamble; everything else is history.
        let preamble: String = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut conversation: Vec<Message> = Vec::new();
        for msg in request.messages.iter().filter(|m| m.role != Role::System) {
            conversation.push(to_rig_message(msg)?);
        }

        let prompt = conversation.pop().ok_or_else(|| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: "Completion request contained no user message".to_string(),
        })?;

        // The prompt is kept separate by rig and appended after the history.
        let mut builder = self.model.completion_request(prompt).messages(conversation);

        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: e.to_string(),
        })?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let input_tokens = u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX);
        let output_tokens = u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX);

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
            finish_reason: FinishReason::Stop,
        })
    }
}
