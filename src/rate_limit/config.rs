//! Rate Limit Configuration
//!
//! Caps and window lengths for the outbound request limiter.

use serde::{Deserialize, Serialize};

/// Default rate limits
pub const DEFAULT_MINUTE_CAP: u32 = 15; // requests per minute
pub const DEFAULT_HOUR_CAP: u32 = 100; // requests per hour
pub const MINUTE_WINDOW_MS: u64 = 60_000;
pub const HOUR_WINDOW_MS: u64 = 3_600_000;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,

    /// Maximum requests within the minute window
    pub minute_cap: u32,

    /// Maximum requests within the hour window
    pub hour_cap: u32,

    /// Length of the short window in milliseconds
    pub minute_window_ms: u64,

    /// Length of the long window in milliseconds
    pub hour_window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            minute_cap: DEFAULT_MINUTE_CAP,
            hour_cap: DEFAULT_HOUR_CAP,
            minute_window_ms: MINUTE_WINDOW_MS,
            hour_window_ms: HOUR_WINDOW_MS,
        }
    }
}

impl RateLimitConfig {
    /// Custom caps with the standard windows
    pub fn with_caps(minute_cap: u32, hour_cap: u32) -> Self {
        Self {
            minute_cap,
            hour_cap,
            ..Self::default()
        }
    }

    /// Apply `REPLY_ASSISTANT_*` overrides; unparsable values are ignored
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("REPLY_ASSISTANT_RATE_LIMIT_ENABLED") {
            self.enabled = val.parse().unwrap_or(self.enabled);
        }

        if let Ok(val) = std::env::var("REPLY_ASSISTANT_MINUTE_CAP") {
            if let Ok(cap) = val.parse::<u32>() {
                if cap > 0 {
                    self.minute_cap = cap;
                }
            }
        }

        if let Ok(val) = std::env::var("REPLY_ASSISTANT_HOUR_CAP") {
            if let Ok(cap) = val.parse::<u32>() {
                if cap > 0 {
                    self.hour_cap = cap;
                }
            }
        }

        self
    }

    /// Disable rate limiting (for testing)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Check the caps and windows are coherent
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.minute_cap == 0 {
            anyhow::bail!("Rate limit minute_cap must be > 0");
        }
        if self.hour_cap < self.minute_cap {
            anyhow::bail!(
                "Rate limit hour_cap ({}) must be >= minute_cap ({})",
                self.hour_cap,
                self.minute_cap
            );
        }
        if self.minute_window_ms == 0 || self.hour_window_ms < self.minute_window_ms {
            anyhow::bail!("Rate limit windows must satisfy 0 < minute window <= hour window");
        }
        Ok(())
    }
}
