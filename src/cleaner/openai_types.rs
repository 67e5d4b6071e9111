//! Chat-completions API types
//!
//! Structs that mirror the OpenAI chat-completions JSON format.
//! Used to serialize requests and deserialize API responses.

use serde::{Deserialize, Serialize};

/// Request structure for the chat-completions endpoint
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest {
    /// Model name, e.g. "gpt-4o-mini"
    pub model: String,
    /// Conversation messages (system + user)
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature; plans are generated at 0.0 for determinism
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Optional response format constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// A single chat message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    /// Message role: "system", "user", or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

/// Response format constraint (e.g. force JSON output)
#[derive(Serialize, Debug)]
pub struct ResponseFormat {
    /// Format type, e.g. "json_object"
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Top-level chat-completions response
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    /// List of completion choices (typically one)
    pub choices: Vec<ChatChoice>,
}

/// A single completion choice
#[derive(Deserialize, Debug)]
pub struct ChatChoice {
    /// The assistant message for this choice
    pub message: ChoiceMessage,
    /// Why the model stopped generating (if reported)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message inside a choice
#[derive(Deserialize, Debug)]
pub struct ChoiceMessage {
    /// The text content (absent when the model refused)
    #[serde(default)]
    pub content: Option<String>,
    /// Refusal message, populated instead of content when the model declines
    #[serde(default)]
    pub refusal: Option<String>,
}
