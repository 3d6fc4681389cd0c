//! Single-prompt completion protocol (Ollama `/api/generate`).

use super::{non_blank, Delegate, DelegateError, Endpoint};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Instruction prepended to every completion prompt.
pub const COMPLETION_SYSTEM_PROMPT: &str =
    "You are a customer feedback analyst. Analyze the data and answer concisely.";

const GENERATE_PATH: &str = "/api/generate";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

/// Kept small: the digest plus a short answer fits a 2k context.
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_ctx: u32,
    num_predict: u32,
    top_k: u32,
    top_p: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            num_ctx: 2048,
            num_predict: 400,
            top_k: 10,
            top_p: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Delegate speaking the completion protocol.
#[derive(Debug, Clone)]
pub struct CompletionDelegate {
    endpoint: Endpoint,
}

impl CompletionDelegate {
    /// `base_url` is the server root, e.g. `http://localhost:11434`.
    pub fn new(
        name: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, DelegateError> {
        Ok(Self {
            endpoint: Endpoint::new(name, base_url, GENERATE_PATH, model, timeout)?,
        })
    }
}

#[async_trait]
impl Delegate for CompletionDelegate {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    async fn try_generate(&self, context: &str) -> Result<String, DelegateError> {
        let request = GenerateRequest {
            model: &self.endpoint.model,
            prompt: format!("{}\n\n{}", COMPLETION_SYSTEM_PROMPT, context),
            stream: false,
            options: GenerateOptions::default(),
        };

        let reply: GenerateResponse = self.endpoint.post_json(&request).await?;
        non_blank(&self.endpoint, reply.response)
    }
}
