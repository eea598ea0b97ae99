//! Completion Gateway
//!
//! Turns one validated reply request into one HTTP POST against the
//! chat-completions endpoint and classifies the outcome. The gateway performs
//! no retries and sets no timeout; it never touches consent or rate-limit
//! state.
//!
//! # Example
//!
//! ```ignore
//! use reply_assistant::gateway::{ApiConfig, CompletionBackend, CompletionGateway};
//! use reply_assistant::tone::Tone;
//!
//! let gateway = CompletionGateway::new(ApiConfig::default());
//! let reply = gateway.complete("sk-...", Tone::Friendly, "Lunch on Friday?").await?;
//! ```

use async_trait::async_trait;
use std::time::Instant;

use super::classify::classify_failure;
use super::config::ApiConfig;
use super::credential::Credential;
use super::protocol::{ChatCompletionResponse, CompletionRequest, ModelList};
use crate::error::ReplyError;
use crate::metrics;
use crate::tone::Tone;

/// Anything that can turn a reply request into text
///
/// The orchestrator depends on this trait so tests can substitute a mock.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a reply for `input` in the given tone
    async fn complete(&self, credential: &str, tone: Tone, input: &str) -> Result<String, ReplyError>;

    /// List model identifiers visible to the credential (connectivity check)
    async fn list_models(&self, credential: &str) -> Result<Vec<String>, ReplyError>;
}

/// HTTP gateway to the completion provider
#[derive(Debug, Clone)]
pub struct CompletionGateway {
    /// Reqwest HTTP client
    client: reqwest::Client,

    config: ApiConfig,
}

impl CompletionGateway {
    /// Create a gateway with a default HTTP client
    pub fn new(config: ApiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a gateway sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: ApiConfig) -> Self {
        Self { client, config }
    }

    /// Send a prepared request; returns the body of a 2xx response
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<String, ReplyError> {
        let response = request
            .send()
            .await
            .map_err(|e| ReplyError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReplyError::NetworkFailure(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let err = classify_failure(status.as_u16(), &body);
            tracing::warn!("Completion API returned {}: {:?}", status, err.kind());
            return Err(err);
        }

        Ok(body)
    }
}

#[async_trait]
impl CompletionBackend for CompletionGateway {
    async fn complete(&self, credential: &str, tone: Tone, input: &str) -> Result<String, ReplyError> {
        let credential = Credential::parse(credential, &self.config.credential_prefix)?;
        let request = CompletionRequest::new(tone, input)?;
        let body = request.to_wire(&self.config);

        let url = self.config.completions_url();
        tracing::debug!(
            "Sending completion request to {} (model={}, tone={}, input_len={})",
            url,
            body.model,
            tone,
            request.input.chars().count()
        );

        let started = Instant::now();
        let result = self
            .execute(
                self.client
                    .post(&url)
                    .bearer_auth(credential.expose())
                    .json(&body),
            )
            .await;
        metrics::COMPLETION_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());

        let response_text = result?;
        let response: ChatCompletionResponse = serde_json::from_str(&response_text).map_err(|e| {
            ReplyError::ProviderError {
                status: 200,
                message: format!("Malformed completion response: {}", e),
            }
        })?;

        response.first_text().ok_or(ReplyError::EmptyCompletion)
    }

    async fn list_models(&self, credential: &str) -> Result<Vec<String>, ReplyError> {
        let credential = Credential::parse(credential, &self.config.credential_prefix)?;
        let url = self.config.models_url();
        tracing::debug!("Listing models at {}", url);

        let body = self
            .execute(self.client.get(&url).bearer_auth(credential.expose()))
            .await?;

        let models: ModelList = serde_json::from_str(&body).map_err(|e| ReplyError::ProviderError {
            status: 200,
            message: format!("Malformed model list: {}", e),
        })?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}
