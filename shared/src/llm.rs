//! Wire types for OpenAI-compatible chat-completion upstreams.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder relayed when a successful completion carries no usable text.
pub const EMPTY_REPLY: &str = "empty response";

/// One message in the outbound chat payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The fixed payload shape sent to every chat upstream.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the reply text out of a successful completion body.
///
/// Returns `None` for anything that is not the expected shape, including an
/// empty or whitespace-only completion; callers substitute [`EMPTY_REPLY`].
pub fn extract_reply(body: &str) -> Option<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body).ok()?;
    response
        .choices
        .into_iter()
        .next()?
        .message?
        .content
        .filter(|content| !content.trim().is_empty())
}

/// Pull a human-readable message out of an upstream error payload.
///
/// Tries the OpenAI shape (`error.message`), then a bare `error` string,
/// then a top-level `message`. Returns `None` for non-JSON bodies; callers
/// fall back to relaying the raw payload text.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
