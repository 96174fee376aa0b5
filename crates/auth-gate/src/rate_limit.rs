//! Sliding 60-second window rate limiter, per-client (spec.md §4.H
//! "Rate limiting"). No teacher crate implements this directly; authored
//! fresh in the pack's `DashMap`-per-key idiom (same shape as
//! `rust-auth-service/src/store.rs`'s per-entry map), grounded on
//! `migration_assistant/api/auth.py::check_rate_limit`'s exact semantics:
//! a deque of request timestamps per client, trimmed to the window on
//! each check.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MAX_REQUESTS: usize = 100;

#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    hits: Arc<DashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self { window: Duration::from_secs(window_secs), max_requests, hits: Arc::new(DashMap::new()) }
    }

    /// Records a request attempt for `client_id` and reports whether it
    /// is within the limit. Returns `Some(retry_after_secs)` when the
    /// client is over the limit (spec.md §8 property 8).
    pub fn check(&self, client_id: &str) -> Option<u64> {
        let now = Instant::now();
        let mut entry = self.hits.entry(client_id.to_string()).or_default();
        while let Some(&front) = entry.front() {
            if now.duration_since(front) > self.window {
                entry.pop_front();
            } else {
                break;
            }
        }

        if entry.len() >= self.max_requests {
            return Some(self.window.as_secs());
        }
        entry.push_back(now);
        None
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(3, 60);
        assert!(limiter.check("ip:1.2.3.4").is_none());
        assert!(limiter.check("ip:1.2.3.4").is_none());
        assert!(limiter.check("ip:1.2.3.4").is_none());
        assert_eq!(limiter.check("ip:1.2.3.4"), Some(60));
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check("ip:1").is_none());
        assert!(limiter.check("ip:2").is_none());
        assert!(limiter.check("ip:1").is_some());
    }
}
