//! Process-wide request metrics
//!
//! Plain atomic counters constructed once at startup and shared by handle;
//! written on every request completion, read by the health and metrics
//! endpoints.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug)]
pub struct AppMetrics {
    started_at: Instant,
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    /// Cumulative response time across timed requests, in microseconds
    response_time_micros: AtomicU64,
    timed_requests: AtomicU64,
    streams_in_flight: AtomicU64,
}

/// Point-in-time view used by the health/metrics endpoints
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: f64,
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_error: u64,
    pub error_rate_percent: f64,
    pub avg_response_time_ms: f64,
    pub cache_size: usize,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_error: AtomicU64::new(0),
            response_time_micros: AtomicU64::new(0),
            timed_requests: AtomicU64::new(0),
            streams_in_flight: AtomicU64::new(0),
        }
    }

    /// Record one completed request.
    pub fn record_request(&self, success: bool, elapsed: Option<Duration>) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(elapsed) = elapsed {
            self.response_time_micros
                .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
            self.timed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stream_started(&self) {
        self.streams_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stream_finished(&self) {
        self.streams_in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn streams_in_flight(&self) -> u64 {
        self.streams_in_flight.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, cache_size: usize) -> MetricsSnapshot {
        let total = self.requests_total.load(Ordering::Relaxed);
        let success = self.requests_success.load(Ordering::Relaxed);
        let error = self.requests_error.load(Ordering::Relaxed);
        let timed = self.timed_requests.load(Ordering::Relaxed);
        let micros = self.response_time_micros.load(Ordering::Relaxed);

        let error_rate = if total > 0 {
            error as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let avg_ms = if timed > 0 {
            micros as f64 / timed as f64 / 1000.0
        } else {
            0.0
        };

        MetricsSnapshot {
            uptime_seconds: round2(self.started_at.elapsed().as_secs_f64()),
            requests_total: total,
            requests_success: success,
            requests_error: error,
            error_rate_percent: round2(error_rate),
            avg_response_time_ms: round1(avg_ms),
            cache_size,
        }
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
