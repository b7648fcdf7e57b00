use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub provider: ProviderConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Cerebras chat-completion settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Timeout for receiving the first byte of the upstream stream
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window, per client address
    pub requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Ceiling for fetched or pasted content, in bytes. Oversized content is
    /// rejected, never truncated.
    pub max_file_bytes: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Consecutive undecodable upstream records tolerated before the stream
    /// is failed
    pub max_parse_failures: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.cerebras.ai".to_string(),
            model: "llama3.1-8b".to_string(),
            temperature: 0.4,
            max_tokens: 1200,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 30,
            window_seconds: 60,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 120_000,
            timeout_secs: 15,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl_seconds: 3600,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_parse_failures: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from files, `APP__`-prefixed environment, and the
    /// flat environment names the service has always used
    /// (`CEREBRAS_API_KEY`, `ALLOWED_ORIGINS`, `RATE_LIMIT`, `MAX_FILE_BYTES`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.apply_env_overrides()?;
        app_config.validate()?;

        Ok(app_config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), config::ConfigError> {
        if let Ok(key) = std::env::var("CEREBRAS_API_KEY") {
            self.provider.api_key = key;
        }

        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = parse_origins(&origins);
        }

        if let Ok(limit) = std::env::var("RATE_LIMIT") {
            self.rate_limit = parse_rate_limit(&limit)
                .map_err(|e| config::ConfigError::Message(format!("RATE_LIMIT: {}", e)))?;
        }

        if let Ok(max) = std::env::var("MAX_FILE_BYTES") {
            self.fetch.max_file_bytes = max
                .trim()
                .parse()
                .map_err(|e| config::ConfigError::Message(format!("MAX_FILE_BYTES: {}", e)))?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.provider.api_key.is_empty() {
            return Err(config::ConfigError::Message(
                "Missing env vars: CEREBRAS_API_KEY".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Parse a rate limit spec: a bare number means requests per minute;
/// `N/second`, `N/minute`, and `N/hour` set the window explicitly.
fn parse_rate_limit(raw: &str) -> Result<RateLimitConfig, String> {
    let raw = raw.trim();

    let (count, window_seconds) = match raw.split_once('/') {
        None => (raw, 60),
        Some((count, unit)) => {
            let window = match unit.trim() {
                "second" => 1,
                "minute" => 60,
                "hour" => 3600,
                other => return Err(format!("unknown window '{}'", other)),
            };
            (count, window)
        }
    };

    let requests: u32 = count
        .trim()
        .parse()
        .map_err(|e| format!("invalid request count: {}", e))?;

    if requests == 0 {
        return Err("request count must be positive".to_string());
    }

    Ok(RateLimitConfig {
        requests,
        window_seconds,
    })
}
