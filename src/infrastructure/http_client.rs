//! HTTP client abstraction shared by the provider and the content fetcher

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use crate::domain::{ByteStream, DomainError};

/// Trait for HTTP operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// POST a JSON body and return the raw response byte stream.
    async fn post_json_stream(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<ByteStream, DomainError>;

    /// GET a body of at most `max_bytes`. Larger bodies are a fetch error,
    /// not a truncation.
    async fn get_bytes(&self, url: &str, max_bytes: usize) -> Result<Bytes, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Client with only a connect timeout. Streaming responses stay open for
    /// as long as the upstream keeps producing, so a total request timeout
    /// would cut long completions short.
    pub fn with_connect_timeout(timeout: std::time::Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json_stream(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<ByteStream, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::provider("http", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                "http",
                format!("HTTP {}: {}", status, truncate(&error_body, 160)),
            ));
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| DomainError::provider("http", format!("Stream error: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn get_bytes(&self, url: &str, max_bytes: usize) -> Result<Bytes, DomainError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::fetch(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::fetch(format!(
                "Fetch failed {}",
                response.status().as_u16()
            )));
        }

        if let Some(length) = response.content_length() {
            if length as usize > max_bytes {
                return Err(DomainError::fetch(format!(
                    "Content too large ({} > {})",
                    length, max_bytes
                )));
            }
        }

        // Content-Length may be absent or wrong; enforce the cap while reading
        // so an oversized body never fully lands in memory.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| DomainError::fetch(format!("Read failed: {}", e)))?;
            if body.len() + chunk.len() > max_bytes {
                return Err(DomainError::fetch(format!(
                    "Content too large (> {})",
                    max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Bytes::from(body))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
