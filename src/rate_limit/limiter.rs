//! Sliding-Window Rate Limiter
//!
//! Keeps an ascending ledger of request timestamps and admits a new request
//! only while both the minute window and the hour window are below their caps.
//!
//! Windows are evaluated lazily: nothing refills on a timer, entries simply
//! age out. An entry whose age equals the window length is already outside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

use super::config::RateLimitConfig;
use crate::clock::{Clock, SystemClock};
use crate::error::ReplyError;

/// Snapshot of limiter usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Requests inside the minute window
    pub requests_this_minute: u32,

    /// Requests inside the hour window
    pub requests_this_hour: u32,

    /// Minute window cap
    pub minute_cap: u32,

    /// Hour window cap
    pub hour_cap: u32,

    /// Milliseconds until the oldest minute-window entry expires
    pub reset_time: u64,
}

/// Client-side admission control over outbound completion requests
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    /// Request timestamps, oldest first
    ledger: VecDeque<DateTime<Utc>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("ledger_len", &self.ledger.len())
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter reading time from `clock`
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            ledger: VecDeque::new(),
        }
    }

    /// Create a limiter on the system clock
    pub fn with_system_clock(config: RateLimitConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    fn age_ms(now: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
        (now - at).num_milliseconds()
    }

    fn window_ms(window: u64) -> i64 {
        i64::try_from(window).unwrap_or(i64::MAX)
    }

    /// Drop entries that have left the hour window
    fn prune(&mut self, now: DateTime<Utc>) {
        let hour = Self::window_ms(self.config.hour_window_ms);
        let before = self.ledger.len();
        while let Some(oldest) = self.ledger.front() {
            if Self::age_ms(now, *oldest) >= hour {
                self.ledger.pop_front();
            } else {
                break;
            }
        }
        let pruned = before - self.ledger.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} expired request timestamps", pruned);
        }
    }

    /// Entries younger than `window_ms`
    fn count_within(&self, now: DateTime<Utc>, window_ms: u64) -> u32 {
        let window = Self::window_ms(window_ms);
        let count = self
            .ledger
            .iter()
            .rev()
            .take_while(|at| Self::age_ms(now, **at) < window)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Admission check: prunes, then tests both caps
    pub fn can_make_request(&mut self) -> bool {
        if !self.config.enabled {
            return true;
        }

        let now = self.clock.now();
        self.prune(now);

        let this_minute = self.count_within(now, self.config.minute_window_ms);
        let this_hour = self.count_within(now, self.config.hour_window_ms);

        this_minute < self.config.minute_cap && this_hour < self.config.hour_cap
    }

    /// Admission check that reports the reset delay on refusal
    pub fn check(&mut self) -> Result<(), ReplyError> {
        if self.can_make_request() {
            Ok(())
        } else {
            let reset_time_ms = self.get_reset_time();
            tracing::warn!("Local rate limit reached, resets in {}ms", reset_time_ms);
            Err(ReplyError::RateLimited { reset_time_ms })
        }
    }

    /// Append the current time to the ledger
    pub fn record_request(&mut self) {
        let now = self.clock.now();
        // Keep the ledger ascending even if the clock steps backwards
        let at = match self.ledger.back() {
            Some(last) if *last > now => *last,
            _ => now,
        };
        self.ledger.push_back(at);
    }

    /// Milliseconds until the oldest entry in the minute window leaves it
    pub fn get_reset_time(&self) -> u64 {
        let now = self.clock.now();
        let minute = Self::window_ms(self.config.minute_window_ms);

        self.ledger
            .iter()
            .find(|at| Self::age_ms(now, **at) < minute)
            .map(|oldest| {
                let remaining = minute - Self::age_ms(now, *oldest);
                remaining.clamp(0, minute) as u64
            })
            .unwrap_or(0)
    }

    /// Usage snapshot; prunes expired entries first
    pub fn get_usage_stats(&mut self) -> UsageStats {
        let now = self.clock.now();
        self.prune(now);

        UsageStats {
            requests_this_minute: self.count_within(now, self.config.minute_window_ms),
            requests_this_hour: self.count_within(now, self.config.hour_window_ms),
            minute_cap: self.config.minute_cap,
            hour_cap: self.config.hour_cap,
            reset_time: self.get_reset_time(),
        }
    }

    /// Copy of the ledger, oldest first
    pub fn snapshot(&self) -> Vec<DateTime<Utc>> {
        self.ledger.iter().copied().collect()
    }

    /// Replace the ledger with previously snapshotted timestamps
    pub fn restore(&mut self, mut timestamps: Vec<DateTime<Utc>>) {
        timestamps.sort();
        self.ledger = timestamps.into();
        let now = self.clock.now();
        self.prune(now);
    }

    /// Number of entries currently held
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }
}
