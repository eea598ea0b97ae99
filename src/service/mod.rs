//! Email Reply Service
//!
//! The orchestrator UI code talks to. One instance owns the consent manager,
//! the rate limiter and a completion backend, and runs every reply through
//! the same gate sequence:
//!
//! ```text
//! generate(input, tone)
//!   │
//!   ├─ input blank / too short ───────────────► EmptyInput / InputTooShort
//!   ├─ tone outside active mode ──────────────► UnsupportedTone
//!   ├─ ConsentManager::has_consent ─── false ─► ConsentRequired
//!   ├─ credential in store ─────────── none ──► MissingCredential
//!   ├─ RateLimiter::check ──────────── full ──► RateLimited { reset_time }
//!   ├─ CompletionBackend::complete ── error ──► provider failure, unchanged
//!   └─ RateLimiter::record_request ───────────► Ok(text)
//! ```
//!
//! Usage tracking fires on every path once the call is made and never
//! affects its result.
//!
//! The limiter lock is released before the network call, so two concurrent
//! `generate` calls may both be admitted when one slot remains.

pub mod message;
pub mod usage;

pub use message::{ReplyOutcome, Request, Response};
pub use usage::{MetricsUsageTracker, UsageEvent, UsageTracker};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::clock::Clock;
use crate::consent::{ConsentConfig, ConsentInfo, ConsentManager};
use crate::error::ReplyError;
use crate::gateway::{CompletionBackend, Credential};
use crate::logging::RequestId;
use crate::metrics;
use crate::rate_limit::{RateLimitConfig, RateLimiter, UsageStats};
use crate::storage::{self, keys, KeyValueStore, Values};
use crate::tone::{Tone, ToneMode};

/// Minimum trimmed input length accepted by default
pub const DEFAULT_MIN_INPUT_CHARS: usize = 10;

/// Reply policy (`[reply]` section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Which tones are offered
    pub tone_mode: ToneMode,

    /// Shortest trimmed input, in characters
    pub min_input_chars: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            tone_mode: ToneMode::Full,
            min_input_chars: DEFAULT_MIN_INPUT_CHARS,
        }
    }
}

/// Everything the service needs besides its collaborators
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub reply: ReplyConfig,
    pub rate_limit: RateLimitConfig,
    pub consent: ConsentConfig,
    /// Prefix a stored credential must start with
    pub credential_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            reply: ReplyConfig::default(),
            rate_limit: RateLimitConfig::default(),
            consent: ConsentConfig::default(),
            credential_prefix: crate::gateway::config::DEFAULT_CREDENTIAL_PREFIX.to_string(),
        }
    }
}

/// Orchestrates consent, rate limiting and the completion backend
pub struct EmailReplyService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    consent: ConsentManager,
    limiter: Mutex<RateLimiter>,
    backend: Arc<dyn CompletionBackend>,
    tracker: Arc<dyn UsageTracker>,
    reply: ReplyConfig,
    credential_prefix: String,
}

impl EmailReplyService {
    /// Create a service that reports usage to the metrics registry
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        let consent = ConsentManager::new(store.clone(), clock.clone(), config.consent);
        let limiter = RateLimiter::new(config.rate_limit, clock.clone());

        Self {
            store,
            clock,
            consent,
            limiter: Mutex::new(limiter),
            backend,
            tracker: Arc::new(MetricsUsageTracker::new()),
            reply: config.reply,
            credential_prefix: config.credential_prefix,
        }
    }

    /// Replace the usage tracker
    pub fn with_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn reply_config(&self) -> &ReplyConfig {
        &self.reply
    }

    pub fn consent(&self) -> &ConsentManager {
        &self.consent
    }

    /// Generate a reply to `input` in `tone`
    pub async fn generate(&self, input: &str, tone: Tone) -> Result<String, ReplyError> {
        let request_id = RequestId::new();
        let span = tracing::info_span!("generate", request_id = %request_id, tone = %tone);

        async move {
            let input = input.trim();
            let input_length = input.chars().count();

            let result = self.run_gates(input, tone).await;
            match &result {
                Ok(text) => tracing::info!(output_length = text.chars().count(), "Reply ready"),
                Err(err) => tracing::debug!(kind = %err.kind(), "Reply refused"),
            }

            self.track(request_id, tone, input_length, &result).await;
            result
        }
        .instrument(span)
        .await
    }

    async fn run_gates(&self, input: &str, tone: Tone) -> Result<String, ReplyError> {
        if input.is_empty() {
            return Err(ReplyError::EmptyInput);
        }
        let actual = input.chars().count();
        if actual < self.reply.min_input_chars {
            return Err(ReplyError::InputTooShort {
                min: self.reply.min_input_chars,
                actual,
            });
        }

        self.reply.tone_mode.check(tone)?;

        if !self.consent.has_consent().await? {
            return Err(ReplyError::ConsentRequired);
        }

        let credential = self
            .stored_credential()
            .await?
            .ok_or(ReplyError::MissingCredential)?;

        if let Err(err) = self.limiter.lock().await.check() {
            metrics::RATE_LIMIT_REJECTIONS_TOTAL.inc();
            return Err(err);
        }

        let text = self.backend.complete(&credential, tone, input).await?;

        self.limiter.lock().await.record_request();
        Ok(text)
    }

    /// Best-effort usage tracking; errors are logged and dropped
    async fn track(
        &self,
        request_id: RequestId,
        tone: Tone,
        input_length: usize,
        result: &Result<String, ReplyError>,
    ) {
        let event = UsageEvent {
            request_id,
            tone,
            input_length,
            output_length: result.as_ref().ok().map(|text| text.chars().count()),
            error: result.as_ref().err().map(ReplyError::kind),
            timestamp: self.clock.now(),
        };

        if let Err(e) = self.tracker.track(&event).await {
            tracing::warn!("Usage tracking failed: {:#}", e);
        }
    }

    /// Raw stored credential, treating blank as absent
    async fn stored_credential(&self) -> Result<Option<String>, ReplyError> {
        let credential = storage::get_string(self.store.as_ref(), keys::API_KEY).await?;
        Ok(credential.filter(|c| !c.trim().is_empty()))
    }

    pub async fn grant_consent(&self) -> Result<ConsentInfo, ReplyError> {
        let info = self.consent.grant_consent().await?;
        metrics::CONSENT_CHANGES_TOTAL.with_label_values(&["grant"]).inc();
        Ok(info)
    }

    /// Revoke consent; the stored credential is deleted with it
    pub async fn revoke_consent(&self) -> Result<(), ReplyError> {
        self.consent.revoke_consent().await?;
        metrics::CONSENT_CHANGES_TOTAL.with_label_values(&["revoke"]).inc();
        Ok(())
    }

    pub async fn consent_info(&self) -> Result<ConsentInfo, ReplyError> {
        Ok(self.consent.get_consent_info().await?)
    }

    pub async fn usage_stats(&self) -> UsageStats {
        self.limiter.lock().await.get_usage_stats()
    }

    /// Validate and store a credential
    pub async fn save_credential(&self, raw: &str) -> Result<(), ReplyError> {
        let credential = Credential::parse(raw, &self.credential_prefix)?;

        let mut values = Values::new();
        values.insert(
            keys::API_KEY.to_string(),
            serde_json::Value::String(credential.expose().to_string()),
        );
        self.store.set(values).await?;

        tracing::info!("Credential saved ({})", credential.redacted());
        Ok(())
    }

    pub async fn clear_credential(&self) -> Result<(), ReplyError> {
        self.store.remove(&[keys::API_KEY]).await?;
        tracing::info!("Credential cleared");
        Ok(())
    }

    pub async fn has_credential(&self) -> Result<bool, ReplyError> {
        Ok(self.stored_credential().await?.is_some())
    }

    /// Check the credential against the provider's model listing
    ///
    /// Sends no user text, so consent is not required.
    pub async fn test_connection(&self) -> Result<usize, ReplyError> {
        let credential = self
            .stored_credential()
            .await?
            .ok_or(ReplyError::MissingCredential)?;

        let models = self.backend.list_models(&credential).await?;
        tracing::info!("Connection OK, {} models visible", models.len());
        Ok(models.len())
    }

    /// Current ledger, oldest first
    pub async fn ledger_snapshot(&self) -> Vec<DateTime<Utc>> {
        self.limiter.lock().await.snapshot()
    }

    /// Replace the ledger (expired entries are dropped)
    pub async fn restore_ledger(&self, timestamps: Vec<DateTime<Utc>>) {
        self.limiter.lock().await.restore(timestamps);
    }

    /// Load a ledger previously written by [`Self::save_ledger`]
    ///
    /// An unreadable ledger is discarded with a warning.
    pub async fn load_ledger(&self) -> Result<(), ReplyError> {
        let mut values = self.store.get(&[keys::REQUEST_LEDGER]).await?;
        let Some(raw) = values.remove(keys::REQUEST_LEDGER) else {
            return Ok(());
        };

        match serde_json::from_value::<Vec<DateTime<Utc>>>(raw) {
            Ok(timestamps) => self.restore_ledger(timestamps).await,
            Err(e) => tracing::warn!("Ignoring unreadable request ledger: {}", e),
        }
        Ok(())
    }

    /// Persist the ledger to the store
    pub async fn save_ledger(&self) -> Result<(), ReplyError> {
        let snapshot = self.ledger_snapshot().await;
        let value = serde_json::to_value(snapshot)
            .map_err(|e| ReplyError::Storage(format!("Failed to encode request ledger: {}", e)))?;

        let mut values = Values::new();
        values.insert(keys::REQUEST_LEDGER.to_string(), value);
        self.store.set(values).await?;
        Ok(())
    }
}
