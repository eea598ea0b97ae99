//! Completion API configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_CREDENTIAL_PREFIX: &str = "sk-";

/// Endpoint, model and fixed generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL; `/chat/completions` and `/models` are appended
    pub base_url: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Maximum output tokens
    pub max_tokens: u32,

    pub temperature: f32,

    /// Nucleus sampling
    pub top_p: f32,

    pub frequency_penalty: f32,

    pub presence_penalty: f32,

    /// Prefix every valid credential starts with
    pub credential_prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 500,
            temperature: 0.7,
            top_p: 1.0,
            frequency_penalty: 0.2,
            presence_penalty: 0.1,
            credential_prefix: DEFAULT_CREDENTIAL_PREFIX.to_string(),
        }
    }
}

impl ApiConfig {
    /// Point the gateway at a different server (tests, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn models_url(&self) -> String {
        format!("{}/models", self.base_url.trim_end_matches('/'))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("API base_url must not be empty");
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("API model must not be empty");
        }
        if self.credential_prefix.is_empty() {
            anyhow::bail!("API credential_prefix must not be empty");
        }
        if self.max_tokens == 0 {
            anyhow::bail!("API max_tokens must be > 0");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!("API temperature must be within [0, 2], got {}", self.temperature);
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            anyhow::bail!("API top_p must be within (0, 1], got {}", self.top_p);
        }
        Ok(())
    }
}
