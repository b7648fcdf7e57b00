//! Infrastructure implementations

pub mod cache;
pub mod fetcher;
pub mod http_client;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod prompt;
pub mod rate_limit;
pub mod relay;
pub mod sanitizer;
