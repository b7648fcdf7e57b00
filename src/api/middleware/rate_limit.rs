//! Per-client admission check, applied before any fetch or upstream work

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_id = client_identifier(request.headers(), addr);
    let result = state.rate_limiter.check_and_record(&client_id).await;

    if !result.allowed {
        warn!(client = %client_id, limit = result.limit, "Rate limit exceeded");
        state.metrics.record_request(false, None);

        let mut response = ApiError::rate_limited(format!(
            "Rate limit exceeded: {} requests per {} seconds",
            result.limit,
            state.rate_limiter.window_seconds()
        ))
        .into_response();

        if let Ok(value) = HeaderValue::from_str(&result.reset_in_seconds.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        return response;
    }

    next.run(request).await
}

/// Behind a proxy the peer address is the proxy; prefer the first
/// `X-Forwarded-For` entry when present.
fn client_identifier(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "10.0.0.1:4242".parse().unwrap()
    }

    #[test]
    fn test_client_identifier_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.7, 10.0.0.2".parse().unwrap(),
        );
        assert_eq!(client_identifier(&headers, addr()), "203.0.113.7");
    }

    #[test]
    fn test_client_identifier_falls_back_to_peer() {
        assert_eq!(client_identifier(&HeaderMap::new(), addr()), "10.0.0.1");
    }

    #[test]
    fn test_client_identifier_ignores_empty_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "  ".parse().unwrap());
        assert_eq!(client_identifier(&headers, addr()), "10.0.0.1");
    }
}
