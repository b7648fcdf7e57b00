//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, CorsConfig, FetchConfig, LogFormat, LoggingConfig, ProviderConfig,
    RateLimitConfig, RelayConfig, ServerConfig,
};
