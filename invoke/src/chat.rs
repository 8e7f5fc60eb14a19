//! Minimal OpenAI-compatible chat completion client.
//!
//! One `complete` call is one model call: no retries happen here. Wrap it in
//! [`crate::ResilientInvoker`] for those.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::BackendConfig;
use crate::error::{InvokeError, Result};

/// Client for `POST {base_url}/chat/completions`.
pub struct ChatClient {
    config: BackendConfig,
    client: reqwest::Client,
}

impl ChatClient {
    /// Build a client honouring the configured request timeout.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Send a system prompt and a user message, returning the reply text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(
            "Sending chat completion to {:?} model {}",
            self.config.family, self.config.model
        );

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .json(&body);

        if let Some(env_var) = self.config.family.api_key_env() {
            let key = self
                .config
                .api_key
                .as_ref()
                .ok_or(InvokeError::MissingApiKey(env_var))?;
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(InvokeError::Api(format!("{status}: {error_text}")));
        }

        let result: ChatResponse = response.json().await?;
        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(InvokeError::EmptyResponse)?;

        info!("Received {} characters from {}", content.len(), self.config.model);
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}
