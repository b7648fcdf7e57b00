//! Per-client rate limiter
//!
//! Sliding-window admission check keyed by client identifier (remote
//! address). Runs before any fetch or upstream work.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::config::RateLimitConfig;

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    /// Seconds until the oldest request leaves the window
    pub reset_in_seconds: u64,
}

/// Sliding-window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    records: RwLock<HashMap<String, Vec<Instant>>>,
    requests: u32,
    window: Duration,
    cleanup_interval: Duration,
    last_cleanup: RwLock<Instant>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            requests: config.requests.max(1),
            window: Duration::from_secs(config.window_seconds.max(1)),
            cleanup_interval: Duration::from_secs(300),
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.requests
    }

    pub fn window_seconds(&self) -> u64 {
        self.window.as_secs()
    }

    /// Check the window for `client_id` and record the request if allowed.
    pub async fn check_and_record(&self, client_id: &str) -> RateLimitResult {
        self.maybe_cleanup().await;

        let now = Instant::now();
        let window_start = now.checked_sub(self.window).unwrap_or(now);

        let mut records = self.records.write().await;
        let timestamps = records.entry(client_id.to_string()).or_default();
        timestamps.retain(|t| *t >= window_start);

        let count = timestamps.len() as u32;
        if count >= self.requests {
            let reset_in = timestamps
                .iter()
                .min()
                .map(|t| {
                    let elapsed = now.duration_since(*t);
                    self.window.as_secs().saturating_sub(elapsed.as_secs())
                })
                .unwrap_or_else(|| self.window.as_secs());

            return RateLimitResult {
                allowed: false,
                remaining: 0,
                limit: self.requests,
                reset_in_seconds: reset_in,
            };
        }

        timestamps.push(now);

        RateLimitResult {
            allowed: true,
            remaining: self.requests - count - 1,
            limit: self.requests,
            reset_in_seconds: self.window.as_secs(),
        }
    }

    async fn maybe_cleanup(&self) {
        let should_cleanup = {
            let last = self.last_cleanup.read().await;
            last.elapsed() >= self.cleanup_interval
        };

        if should_cleanup {
            let mut last = self.last_cleanup.write().await;
            *last = Instant::now();

            let now = Instant::now();
            let cutoff = now.checked_sub(self.window).unwrap_or(now);

            let mut records = self.records.write().await;
            for timestamps in records.values_mut() {
                timestamps.retain(|t| *t >= cutoff);
            }
            records.retain(|_, v| !v.is_empty());
        }
    }
}
