use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{
    origin_gate_middleware, rate_limit_middleware, security_headers_middleware,
};
use super::routes;
use super::state::AppState;
use crate::config::CorsConfig;

/// Create the application router. The origin gate and rate limiter apply to
/// the streaming endpoints only; health and metrics stay open for probes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    // Bound request bodies a little above the content ceiling so the JSON
    // envelope around a maximum-size snippet still fits.
    let body_limit = state.config.fetch.max_file_bytes + 16 * 1024;

    Router::new()
        .route("/api/review", post(routes::review::review))
        .route("/api/analyze-repo", post(routes::review::analyze_repo))
        .route_layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            origin_gate_middleware,
        ))
        .route("/api/health", get(health::health_check))
        .route("/api/metrics", get(health::metrics))
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
