//! OpenAI-compatible `chat/completions` payloads.

use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

impl ChatCompletionRequest {
    /// Single-turn prompt: optional system message, then the user's text.
    pub fn single_turn(cfg: &Config, text: &str) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !cfg.system_prompt.trim().is_empty() {
            messages.push(ChatMessage::system(cfg.system_prompt.clone()));
        }
        messages.push(ChatMessage::user(text));

        Self {
            model: cfg.model_name.clone(),
            messages,
            stream: false,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

/// Pull the generated text out of a success body.
///
/// Returns a short description of what was wrong when the body is unusable.
pub fn extract_text(body: &str) -> Result<String, String> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid json: {e}"))?;

    let Some(first) = parsed.choices.into_iter().next() else {
        return Err("response has no choices".to_string());
    };

    let text = first
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| "choices[0].message.content missing".to_string())?;

    if text.trim().is_empty() {
        return Err("choices[0].message.content is empty".to_string());
    }
    Ok(text)
}
