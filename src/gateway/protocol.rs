//! Completion API wire types
//!
//! Request and response bodies for the chat-completions endpoint, plus the
//! domain-level [`CompletionRequest`] they are built from.

use serde::{Deserialize, Serialize};

use super::config::ApiConfig;
use crate::error::ReplyError;
use crate::tone::Tone;

/// Framing placed before the user's email text
pub const USER_FRAMING: &str = "Please write a reply to the following email:";

/// Validated request for one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub tone: Tone,
    /// Trimmed, non-empty email text
    pub input: String,
    pub system_prompt: String,
}

impl CompletionRequest {
    pub fn new(tone: Tone, input: &str) -> Result<Self, ReplyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ReplyError::EmptyInput);
        }
        Ok(Self {
            tone,
            input: input.to_string(),
            system_prompt: tone.system_prompt(),
        })
    }

    /// User message content
    pub fn user_message(&self) -> String {
        format!("{}\n\n{}", USER_FRAMING, self.input)
    }

    /// Wire body for the chat-completions endpoint
    pub fn to_wire(&self, config: &ApiConfig) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(self.user_message()),
            ],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: String) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content),
        }
    }

    pub fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content),
        }
    }
}

/// POST body for `/chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

/// Successful `/chat/completions` response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Absent and `null` both mean "no choices"
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatCompletionResponse {
    /// Trimmed text of the first choice, if it has any
    pub fn first_text(&self) -> Option<String> {
        self.choices
            .as_deref()
            .and_then(<[Choice]>::first)
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Error body returned by the provider on failure
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderErrorBody {
    pub error: ProviderErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

/// `/models` listing
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}
