//! Application state shared across request handlers
//!
//! All process-scoped objects (cache, metrics, limiter) are constructed once
//! at startup and passed by handle; nothing lives in module-level globals.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::CompletionProvider;
use crate::infrastructure::cache::ContentCache;
use crate::infrastructure::fetcher::ContentFetcher;
use crate::infrastructure::observability::AppMetrics;
use crate::infrastructure::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub metrics: Arc<AppMetrics>,
    pub cache: Arc<ContentCache>,
    pub fetcher: Arc<ContentFetcher>,
    pub provider: Arc<dyn CompletionProvider>,
    pub rate_limiter: Arc<RateLimiter>,
}
