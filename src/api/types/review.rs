//! Wire types for the review endpoints

use serde::{Deserialize, Serialize};

use crate::domain::StreamEvent;

/// Body of `POST /api/review`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequestBody {
    pub code: Option<String>,
    pub url: Option<String>,
    pub urls: Option<Vec<String>>,
    /// Absent mode defaults to `bugs`; unknown strings are rejected.
    pub mode: Option<String>,
}

/// Body of `POST /api/analyze-repo`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRepoRequestBody {
    pub repository_url: Option<String>,
    pub mode: Option<String>,
}

/// One outbound SSE record in the OpenAI-compatible delta shape the client
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    pub choices: Vec<StreamChoice>,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub delta: StreamDelta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDelta {
    pub content: String,
}

impl StreamRecord {
    fn new(content: impl Into<String>, event: &str, done: bool) -> Self {
        Self {
            choices: vec![StreamChoice {
                delta: StreamDelta {
                    content: content.into(),
                },
            }],
            event: event.to_string(),
            done: done.then_some(true),
        }
    }

    pub fn from_event(event: &StreamEvent) -> Self {
        match event {
            StreamEvent::Token { content } => Self::new(content.clone(), "token", false),
            StreamEvent::End => Self::new("", "end", true),
            StreamEvent::Error { message } => Self::new(message.clone(), "error", true),
        }
    }
}
