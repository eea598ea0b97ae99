//! Property-Based Tests for the Rate Limiter
//!
//! Random request schedules against a mock clock, checking the sliding-window
//! invariants hold for every schedule.
//!
//! ```bash
//! cargo test --lib rate_limit::proptests
//! ```

use proptest::prelude::*;
use std::sync::Arc;

use crate::clock::{Clock, MockClock};
use crate::rate_limit::{RateLimitConfig, RateLimiter};

fn limiter(minute_cap: u32, hour_cap: u32) -> (RateLimiter, MockClock) {
    let clock = MockClock::default();
    let limiter = RateLimiter::new(
        RateLimitConfig::with_caps(minute_cap, hour_cap),
        Arc::new(clock.clone()),
    );
    (limiter, clock)
}

// ============================================================================
// Property 1: Minute cap blocks until the oldest entry ages out
// ============================================================================

proptest! {
    /// Once the minute window holds `minute_cap` entries, admission is refused
    /// until exactly 60s after the oldest of them.
    #[test]
    fn prop_minute_cap_blocks_until_oldest_expires(
        minute_cap in 1u32..20,
        gaps in prop::collection::vec(0i64..3_000, 20),
    ) {
        let (mut limiter, clock) = limiter(minute_cap, 1_000);
        let first = clock.now();

        for gap in gaps.iter().take(minute_cap as usize) {
            prop_assert!(limiter.can_make_request());
            limiter.record_request();
            clock.advance_ms(*gap);
        }
        prop_assert!(!limiter.can_make_request());

        let elapsed = (clock.now() - first).num_milliseconds();
        prop_assert!(elapsed < 60_000);

        // One millisecond before the oldest entry leaves: still blocked
        clock.advance_ms(60_000 - elapsed - 1);
        prop_assert!(!limiter.can_make_request());

        clock.advance_ms(1);
        prop_assert!(limiter.can_make_request());
    }
}

// ============================================================================
// Property 2: Reset time is non-increasing and hits zero on expiry
// ============================================================================

proptest! {
    /// A burst recorded at one instant: the reset delay only ever counts down.
    /// Entries recorded at different instants make the delay jump up when the
    /// oldest leaves and a younger one becomes the reference.
    #[test]
    fn prop_reset_time_monotonic(
        records in 1usize..10,
        steps in prop::collection::vec(0i64..10_000, 1..30),
    ) {
        let (mut limiter, clock) = limiter(100, 1_000);
        for _ in 0..records {
            limiter.record_request();
        }

        let mut previous = limiter.get_reset_time();
        for step in steps {
            clock.advance_ms(step);
            let current = limiter.get_reset_time();
            prop_assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn prop_reset_time_zero_exactly_at_window_edge(offset in 0i64..59_999) {
        let (mut limiter, clock) = limiter(15, 100);
        limiter.record_request();

        clock.advance_ms(offset);
        prop_assert_eq!(limiter.get_reset_time(), (60_000 - offset) as u64);

        clock.advance_ms(60_000 - offset);
        prop_assert_eq!(limiter.get_reset_time(), 0);
    }
}

// ============================================================================
// Property 3: Stats round-trip and window containment
// ============================================================================

proptest! {
    #[test]
    fn prop_stats_count_recent_requests(n in 0u32..15) {
        let (mut limiter, clock) = limiter(15, 100);
        for _ in 0..n {
            limiter.record_request();
            clock.advance_ms(50);
        }

        let stats = limiter.get_usage_stats();
        prop_assert_eq!(stats.requests_this_minute, n);
        prop_assert_eq!(stats.requests_this_hour, n);
    }

    /// The minute window is always a subset of the hour window, and the ledger
    /// never holds entries older than an hour after an admission check.
    #[test]
    fn prop_minute_window_within_hour_window(
        steps in prop::collection::vec((0i64..900_000, any::<bool>()), 1..60),
    ) {
        let (mut limiter, clock) = limiter(15, 100);
        for (step, record) in steps {
            clock.advance_ms(step);
            if limiter.can_make_request() && record {
                limiter.record_request();
            }

            let now = clock.now();
            prop_assert!(limiter
                .snapshot()
                .iter()
                .all(|at| (now - *at).num_milliseconds() < 3_600_000));

            let stats = limiter.get_usage_stats();
            prop_assert!(stats.requests_this_minute <= stats.requests_this_hour);
            prop_assert!(stats.requests_this_minute <= stats.minute_cap);
            prop_assert!(stats.requests_this_hour <= stats.hour_cap);
        }
    }
}
