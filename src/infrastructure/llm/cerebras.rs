use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::domain::{ByteStream, CompletionProvider, DomainError};
use crate::infrastructure::http_client::HttpClientTrait;

const SYSTEM_PROMPT: &str = "You are an expert senior software engineer assistant.";

/// Cerebras chat-completion provider.
///
/// Opens the streaming request and hands the raw byte stream to the relay;
/// no record parsing happens here.
pub struct CerebrasProvider {
    client: Arc<dyn HttpClientTrait>,
    auth_header: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CerebrasProvider {
    pub fn new(client: Arc<dyn HttpClientTrait>, config: &ProviderConfig) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", config.api_key),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "stream": true,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }
}

#[async_trait]
impl CompletionProvider for CerebrasProvider {
    async fn open_stream(&self, prompt: &str) -> Result<ByteStream, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(prompt);

        self.client.post_json_stream(&url, self.headers(), &body).await
    }

    fn provider_name(&self) -> &'static str {
        "cerebras"
    }
}
