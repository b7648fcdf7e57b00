//! Streaming types shared between the relay and the provider layer

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use super::DomainError;

/// Raw byte stream from an upstream HTTP response
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DomainError>> + Send>>;

/// One normalized outbound event.
///
/// `End` and `Error` are terminal; the relay guarantees exactly one terminal
/// event per stream and nothing after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Token { content: String },
    End,
    Error { message: String },
}

impl StreamEvent {
    pub fn token(content: impl Into<String>) -> Self {
        Self::Token {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error { .. })
    }
}

/// Trait for the AI completion provider.
///
/// The provider owns connection setup (auth, request payload, HTTP status
/// handling) and hands back the raw byte stream; all record parsing and
/// filtering happens in the relay.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open a streaming completion for the given prompt.
    async fn open_stream(&self, prompt: &str) -> Result<ByteStream, DomainError>;

    fn provider_name(&self) -> &'static str;
}
