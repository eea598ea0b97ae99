//! Usage tracking
//!
//! Fired once per `generate` call on both the success and failure paths.
//! Tracking is best-effort: the orchestrator logs and drops tracker errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::logging::RequestId;
use crate::metrics;
use crate::tone::Tone;

/// One reply generation attempt, without any user text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    pub request_id: RequestId,
    pub tone: Tone,
    /// Characters in the trimmed input
    pub input_length: usize,
    /// Characters in the reply, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_length: Option<usize>,
    /// Failure kind, on error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    pub timestamp: DateTime<Utc>,
}

/// Sink for usage events
#[async_trait]
pub trait UsageTracker: Send + Sync {
    async fn track(&self, event: &UsageEvent) -> anyhow::Result<()>;
}

/// Records usage in the process metrics registry
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsUsageTracker;

impl MetricsUsageTracker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UsageTracker for MetricsUsageTracker {
    async fn track(&self, event: &UsageEvent) -> anyhow::Result<()> {
        metrics::init()?;

        match event.error {
            None => {
                metrics::REPLIES_GENERATED_TOTAL
                    .with_label_values(&[event.tone.as_str()])
                    .inc();
                tracing::info!(
                    request_id = %event.request_id,
                    tone = %event.tone,
                    input_length = event.input_length,
                    output_length = event.output_length.unwrap_or(0),
                    "Reply generated"
                );
            }
            Some(kind) => {
                metrics::REPLY_FAILURES_TOTAL
                    .with_label_values(&[kind.as_str()])
                    .inc();
                tracing::info!(
                    request_id = %event.request_id,
                    tone = %event.tone,
                    input_length = event.input_length,
                    error = %kind,
                    "Reply generation failed"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(error: Option<ErrorKind>) -> UsageEvent {
        UsageEvent {
            request_id: RequestId::new(),
            tone: Tone::Casual,
            input_length: 42,
            output_length: error.is_none().then_some(120),
            error,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_metrics_tracker_counts_success() {
        let before = metrics::REPLIES_GENERATED_TOTAL
            .with_label_values(&["casual"])
            .get();
        MetricsUsageTracker::new().track(&event(None)).await.unwrap();
        let after = metrics::REPLIES_GENERATED_TOTAL
            .with_label_values(&["casual"])
            .get();
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_metrics_tracker_counts_failure() {
        let before = metrics::REPLY_FAILURES_TOTAL
            .with_label_values(&["auth_error"])
            .get();
        MetricsUsageTracker::new()
            .track(&event(Some(ErrorKind::AuthError)))
            .await
            .unwrap();
        let after = metrics::REPLY_FAILURES_TOTAL
            .with_label_values(&["auth_error"])
            .get();
        assert!(after > before);
    }

    #[test]
    fn test_event_serialization_omits_missing_fields() {
        let json = serde_json::to_value(event(None)).unwrap();
        assert_eq!(json["inputLength"], 42);
        assert_eq!(json["outputLength"], 120);
        assert!(json.get("error").is_none());
    }
}
