//! Model backend selection.
//!
//! The backend family is resolved once, when the configuration is built; the
//! chat client then only matches on [`ModelFamily`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InvokeError, Result};

/// Families of chat backends the client can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Hosted OpenAI models.
    OpenAi,
    /// Llama models served by a local Ollama.
    Llama,
}

impl ModelFamily {
    /// Infer the family from a model name.
    pub fn from_model(model: &str) -> Result<Self> {
        if model.contains("llama") {
            Ok(Self::Llama)
        } else if model.contains("gpt") {
            Ok(Self::OpenAi)
        } else {
            Err(InvokeError::UnknownModel(model.to_string()))
        }
    }

    /// Environment variable holding the API key, if the family needs one.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Llama => None,
        }
    }

    /// OpenAI-compatible endpoint used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Llama => "http://localhost:11434/v1",
        }
    }
}

/// Everything needed to reach one chat model.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub model: String,
    pub family: ModelFamily,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl BackendConfig {
    /// Configuration for `model`, inferring the family from its name and
    /// reading the API key from the environment.
    pub fn for_model(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let family = ModelFamily::from_model(&model)?;
        Ok(Self::with_family(model, family))
    }

    /// Configuration for `model` with an explicit family.
    pub fn with_family(model: impl Into<String>, family: ModelFamily) -> Self {
        Self {
            model: model.into(),
            family,
            temperature: 0.0,
            request_timeout: Duration::from_secs(60),
            base_url: family.default_base_url().to_string(),
            api_key: family.api_key_env().and_then(|var| std::env::var(var).ok()),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}
