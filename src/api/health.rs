//! Health and metrics endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::state::AppState;
use crate::infrastructure::observability::MetricsSnapshot;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub metrics: MetricsSnapshot,
    pub cache: CacheInfo,
}

#[derive(Serialize)]
pub struct CacheInfo {
    pub enabled: bool,
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: u64,
}

/// Extended metrics view: health payload plus provider, rate-limit, and
/// stream details.
#[derive(Serialize)]
pub struct MetricsResponse {
    pub status: &'static str,
    pub version: String,
    pub metrics: MetricsSnapshot,
    pub cache: CacheInfo,
    pub provider: ProviderInfo,
    pub rate_limit: RateLimitInfo,
    pub streams_in_flight: u64,
}

#[derive(Serialize)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub model: String,
}

#[derive(Serialize)]
pub struct RateLimitInfo {
    pub requests: u32,
    pub window_seconds: u64,
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache_size = state.cache.len().await;
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(cache_size),
        cache: cache_info(&state, cache_size),
    };

    (StatusCode::OK, Json(response))
}

/// GET /api/metrics
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let cache_size = state.cache.len().await;
    let response = MetricsResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(cache_size),
        cache: cache_info(&state, cache_size),
        provider: ProviderInfo {
            name: state.provider.provider_name(),
            model: state.config.provider.model.clone(),
        },
        rate_limit: RateLimitInfo {
            requests: state.rate_limiter.limit(),
            window_seconds: state.rate_limiter.window_seconds(),
        },
        streams_in_flight: state.metrics.streams_in_flight(),
    };

    (StatusCode::OK, Json(response))
}

fn cache_info(state: &AppState, size: usize) -> CacheInfo {
    CacheInfo {
        enabled: state.cache.max_entries() > 0,
        size,
        max_size: state.cache.max_entries(),
        ttl_seconds: state.cache.ttl().as_secs(),
    }
}
