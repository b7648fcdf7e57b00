//! CodeSage API
//!
//! A streaming code-review backend: accepts pasted code or GitHub blob URLs,
//! sanitizes prompt-injection patterns, builds a mode-specific review prompt,
//! and relays the Cerebras token stream to the client over SSE.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::CompletionProvider;
use infrastructure::cache::ContentCache;
use infrastructure::fetcher::ContentFetcher;
use infrastructure::http_client::HttpClient;
use infrastructure::llm::CerebrasProvider;
use infrastructure::observability::AppMetrics;
use infrastructure::rate_limit::RateLimiter;

/// Create the application state with all components initialized.
///
/// Two HTTP clients are built on purpose: the fetch client carries a total
/// request timeout, while the provider client only bounds the connect phase
/// so long completions are never cut off mid-stream.
pub fn create_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let config = Arc::new(config);

    let fetch_client = Arc::new(HttpClient::with_timeout(Duration::from_secs(
        config.fetch.timeout_secs,
    ))?);
    let provider_client = Arc::new(HttpClient::with_connect_timeout(Duration::from_secs(
        config.provider.connect_timeout_secs,
    ))?);

    let cache = Arc::new(ContentCache::new(
        config.cache.max_entries,
        Duration::from_secs(config.cache.ttl_seconds),
    ));
    let fetcher = Arc::new(ContentFetcher::new(
        fetch_client,
        cache.clone(),
        config.fetch.max_file_bytes,
    ));
    let provider: Arc<dyn CompletionProvider> =
        Arc::new(CerebrasProvider::new(provider_client, &config.provider));

    Ok(AppState {
        metrics: Arc::new(AppMetrics::new()),
        cache,
        fetcher,
        provider,
        rate_limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
        config,
    })
}
