//! Rate Limiting Module
//!
//! Client-side admission control for outbound completion requests. Two sliding
//! windows share one ledger of request timestamps:
//!
//! - **minute window**: last 60,000 ms, default cap 15
//! - **hour window**: last 3,600,000 ms, default cap 100
//!
//! Hitting either cap blocks admission. The ledger is pruned to the hour window
//! on every admission check; nothing refills proactively.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 RateLimiter                   │
//! ├──────────────────────────────────────────────┤
//! │  ┌────────────────┐   ┌────────────────┐     │
//! │  │ Minute window  │ ⊆ │  Hour window   │     │
//! │  └────────────────┘   └────────────────┘     │
//! ├──────────────────────────────────────────────┤
//! │        Request ledger (ascending)            │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod limiter;

#[cfg(test)]
mod proptests;

pub use config::RateLimitConfig;
pub use limiter::{RateLimiter, UsageStats};
