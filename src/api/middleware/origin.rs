//! Origin allow-list gate for the streaming endpoints
//!
//! The `CorsLayer` only controls browser behavior; this gate enforces the
//! allow-list server-side. A `*` entry disables the check entirely.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;

pub async fn origin_gate_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let allowed = &state.config.cors.allowed_origins;

    if allowed.iter().any(|o| o == "*") {
        return next.run(request).await;
    }

    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match origin {
        Some(ref origin) if allowed.iter().any(|o| o == origin) => next.run(request).await,
        _ => {
            warn!(origin = ?origin, path = %request.uri().path(), "Rejected disallowed origin");
            ApiError::forbidden("Origin not allowed").into_response()
        }
    }
}
