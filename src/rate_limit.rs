//! Per-calendar-source rate limiting for on-demand sync.
//!
//! Fixed-window counter keyed by source id, kept in process memory behind a
//! trait so a shared external counter (e.g. a key-value store with TTL) can
//! replace it for multi-instance deployments without touching call sites.
//! The in-memory state is only correct for a single process.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub trait RateLimiter: Send + Sync {
    /// Record a request against the key; false when the window is full.
    fn allow(&self, key: Uuid) -> bool;

    /// Clear the key's window (used when a source is deleted).
    fn reset(&self, key: Uuid);
}

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct SlidingWindowLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<HashMap<Uuid, Window>>,
}

impl SlidingWindowLimiter {
    /// Spec default: 5 requests per 60-second window per calendar source.
    pub fn for_sync() -> Self {
        Self::new(5, Duration::from_secs(60))
    }

    pub fn new(max_requests: u32, window: Duration) -> Self {
        SlidingWindowLimiter {
            max_requests,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn allow(&self, key: Uuid) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let window = state.entry(key).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return false;
        }

        window.count += 1;
        true
    }

    fn reset(&self, key: Uuid) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixth_request_in_window_rejected() {
        let limiter = SlidingWindowLimiter::for_sync();
        let key = Uuid::new_v4();

        for _ in 0..5 {
            assert!(limiter.allow(key));
        }
        assert!(!limiter.allow(key));
    }

    #[test]
    fn test_window_reset_allows_again() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_millis(20));
        let key = Uuid::new_v4();

        assert!(limiter.allow(key));
        assert!(limiter.allow(key));
        assert!(!limiter.allow(key));

        std::thread::sleep(Duration::from_millis(25));
        assert!(limiter.allow(key));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(limiter.allow(a));
        assert!(!limiter.allow(a));
        assert!(limiter.allow(b));
    }

    #[test]
    fn test_reset_clears_window() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        let key = Uuid::new_v4();

        assert!(limiter.allow(key));
        assert!(!limiter.allow(key));
        limiter.reset(key);
        assert!(limiter.allow(key));
    }
}
