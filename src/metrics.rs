// Prometheus metrics for reply generation
//
// - Replies generated (counter, by tone)
// - Reply failures (counter, by error kind)
// - Local rate-limit rejections (counter)
// - Completion API latency (histogram)
// - Consent transitions (counter, by action)

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    pub static ref REPLIES_GENERATED_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("replies_generated_total", "Total number of replies generated"),
        &["tone"]
    ).expect("Failed to create replies generated metric");

    pub static ref REPLY_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("reply_failures_total", "Total number of failed reply generations"),
        &["kind"]
    ).expect("Failed to create reply failures metric");

    pub static ref RATE_LIMIT_REJECTIONS_TOTAL: IntCounter = IntCounter::new(
        "rate_limit_rejections_total",
        "Requests refused by the local rate limiter"
    ).expect("Failed to create rate limit rejections metric");

    pub static ref COMPLETION_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new("completion_latency_seconds", "Completion API round-trip time in seconds"),
    ).expect("Failed to create completion latency metric");

    pub static ref CONSENT_CHANGES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("consent_changes_total", "Consent grants and revocations"),
        &["action"]
    ).expect("Failed to create consent changes metric");
}

fn register(collector: Box<dyn prometheus::core::Collector>) -> prometheus::Result<()> {
    match REGISTRY.register(collector) {
        Err(prometheus::Error::AlreadyReg) => Ok(()),
        other => other,
    }
}

/// Register all collectors; safe to call more than once
pub fn init() -> prometheus::Result<()> {
    register(Box::new(REPLIES_GENERATED_TOTAL.clone()))?;
    register(Box::new(REPLY_FAILURES_TOTAL.clone()))?;
    register(Box::new(RATE_LIMIT_REJECTIONS_TOTAL.clone()))?;
    register(Box::new(COMPLETION_LATENCY_SECONDS.clone()))?;
    register(Box::new(CONSENT_CHANGES_TOTAL.clone()))?;
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}
