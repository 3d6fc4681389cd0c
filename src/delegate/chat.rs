//! Role-based chat-completion protocol (OpenAI-compatible
//! `/v1/chat/completions`).

use super::{non_blank, Delegate, DelegateError, Endpoint};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// System message sent ahead of the analysis context.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a customer feedback analyst. Provide clear, actionable insights based on the data provided. Be conversational and helpful.";

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Delegate speaking the chat-completion protocol.
#[derive(Debug, Clone)]
pub struct ChatDelegate {
    endpoint: Endpoint,
}

impl ChatDelegate {
    /// `base_url` is the server root, e.g. `http://localhost:8000`.
    pub fn new(
        name: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, DelegateError> {
        Ok(Self {
            endpoint: Endpoint::new(name, base_url, CHAT_COMPLETIONS_PATH, model, timeout)?,
        })
    }
}

#[async_trait]
impl Delegate for ChatDelegate {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    async fn try_generate(&self, context: &str) -> Result<String, DelegateError> {
        let request = ChatRequest {
            model: &self.endpoint.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: CHAT_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: context,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let reply: ChatResponse = self.endpoint.post_json(&request).await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.endpoint.malformed("no choices in response"))?
            .message
            .content;

        non_blank(&self.endpoint, content)
    }
}
