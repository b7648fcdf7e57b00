//! Streaming relay: upstream byte stream in, normalized events out
//!
//! Consumes the provider's byte stream incrementally, filters metadata-only
//! records, and forwards content tokens in arrival order. Guarantees exactly
//! one terminal event (`End` or `Error`) per stream and emits nothing after
//! it. A failed outbound send means the client went away, in which case the
//! upstream connection is dropped immediately instead of draining into
//! nothing.

mod record;

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::domain::{ByteStream, StreamEvent};

pub use record::{decode_record, ParsedRecord, RecordSplitter};

/// Relay lifecycle. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayState {
    Connecting,
    Streaming,
    Completed,
    Failed,
}

/// How a relay run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream finished; the client got exactly one `end`
    Completed,
    /// The client got exactly one `error`
    Failed,
    /// Client disconnected mid-stream; upstream was aborted, nothing more sent
    Disconnected,
}

/// Streaming relay state machine
#[derive(Debug)]
pub struct Relay {
    connect_timeout: Duration,
    max_parse_failures: u32,
}

impl Relay {
    pub fn new(connect_timeout: Duration, config: &RelayConfig) -> Self {
        Self {
            connect_timeout,
            max_parse_failures: config.max_parse_failures.max(1),
        }
    }

    /// Drive one upstream stream to completion, emitting normalized events
    /// into `tx`.
    pub async fn run(&self, mut upstream: ByteStream, tx: &mpsc::Sender<StreamEvent>) -> RelayOutcome {
        let mut state = RelayState::Connecting;
        let mut splitter = RecordSplitter::new();
        let mut consecutive_failures: u32 = 0;

        loop {
            let next = if state == RelayState::Connecting {
                // First byte must arrive within the connect timeout.
                match tokio::time::timeout(self.connect_timeout, upstream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!("No response from provider within connect timeout");
                        return self
                            .fail(
                                tx,
                                &mut state,
                                "Upstream timeout: provider sent no data within the connect window",
                            )
                            .await;
                    }
                }
            } else {
                upstream.next().await
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    warn!(error = %e, "Upstream stream error");
                    return self
                        .fail(tx, &mut state, format!("Stream error: {}", e))
                        .await;
                }
                None => {
                    // Upstream closed. A trailing record without a delimiter
                    // still counts; then the stream ends normally.
                    if let Some(rest) = splitter.finish() {
                        match self
                            .handle_record(&rest, tx, &mut consecutive_failures)
                            .await
                        {
                            RecordAction::Continue => {}
                            RecordAction::Completed => return self.complete(tx, &mut state).await,
                            RecordAction::Disconnected => {
                                state = RelayState::Failed;
                                return RelayOutcome::Disconnected;
                            }
                            RecordAction::TooManyFailures => {
                                return self
                                    .fail(tx, &mut state, "Upstream sent malformed data")
                                    .await;
                            }
                        }
                    }
                    return self.complete(tx, &mut state).await;
                }
            };

            if state == RelayState::Connecting {
                debug!("First upstream byte received, streaming");
                state = RelayState::Streaming;
            }

            for record in splitter.feed(&chunk) {
                match self
                    .handle_record(&record, tx, &mut consecutive_failures)
                    .await
                {
                    RecordAction::Continue => {}
                    RecordAction::Completed => return self.complete(tx, &mut state).await,
                    RecordAction::Disconnected => {
                        state = RelayState::Failed;
                        return RelayOutcome::Disconnected;
                    }
                    RecordAction::TooManyFailures => {
                        return self
                            .fail(tx, &mut state, "Upstream sent malformed data")
                            .await;
                    }
                }
            }
        }
    }

    async fn handle_record(
        &self,
        record: &str,
        tx: &mpsc::Sender<StreamEvent>,
        consecutive_failures: &mut u32,
    ) -> RecordAction {
        match decode_record(record) {
            ParsedRecord::Token(content) => {
                *consecutive_failures = 0;
                if tx.send(StreamEvent::token(content)).await.is_err() {
                    debug!("Client disconnected, aborting upstream");
                    return RecordAction::Disconnected;
                }
                RecordAction::Continue
            }
            ParsedRecord::Done => RecordAction::Completed,
            ParsedRecord::Metadata => {
                *consecutive_failures = 0;
                RecordAction::Continue
            }
            ParsedRecord::Unrecognized => {
                *consecutive_failures += 1;
                debug!(
                    failures = *consecutive_failures,
                    record = %record.chars().take(120).collect::<String>(),
                    "Skipping unrecognized upstream record"
                );
                if *consecutive_failures >= self.max_parse_failures {
                    RecordAction::TooManyFailures
                } else {
                    RecordAction::Continue
                }
            }
        }
    }

    async fn complete(&self, tx: &mpsc::Sender<StreamEvent>, state: &mut RelayState) -> RelayOutcome {
        *state = RelayState::Completed;
        if tx.send(StreamEvent::End).await.is_err() {
            return RelayOutcome::Disconnected;
        }
        RelayOutcome::Completed
    }

    async fn fail(
        &self,
        tx: &mpsc::Sender<StreamEvent>,
        state: &mut RelayState,
        message: impl Into<String>,
    ) -> RelayOutcome {
        *state = RelayState::Failed;
        if tx.send(StreamEvent::error(message)).await.is_err() {
            return RelayOutcome::Disconnected;
        }
        RelayOutcome::Failed
    }
}

enum RecordAction {
    Continue,
    Completed,
    Disconnected,
    TooManyFailures,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    use crate::domain::DomainError;

    fn relay() -> Relay {
        Relay::new(Duration::from_secs(5), &RelayConfig::default())
    }

    fn byte_stream(chunks: Vec<&'static [u8]>) -> ByteStream {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))),
        ))
    }

    async fn collect(relay: Relay, upstream: ByteStream) -> (Vec<StreamEvent>, RelayOutcome) {
        let (tx, mut rx) = mpsc::channel(64);
        let outcome = relay.run(upstream, &tx).await;
        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (events, outcome)
    }

    #[tokio::test]
    async fn test_tokens_forwarded_in_order_and_terminated() {
        let upstream = byte_stream(vec![
            b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\ndata: [DONE]\n\n",
        ]);

        let (events, outcome) = collect(relay(), upstream).await;

        assert_eq!(outcome, RelayOutcome::Completed);
        assert_eq!(
            events,
            vec![
                StreamEvent::token("Hello"),
                StreamEvent::token(" world"),
                StreamEvent::End,
            ]
        );
    }

    #[tokio::test]
    async fn test_record_split_across_read_chunks() {
        let upstream = byte_stream(vec![
            b"data: {\"choices\":[{\"delta\":{\"cont",
            b"ent\":\"abc\"}}]}\n\ndata: [DONE]\n\n",
        ]);

        let (events, outcome) = collect(relay(), upstream).await;

        assert_eq!(outcome, RelayOutcome::Completed);
        assert_eq!(events, vec![StreamEvent::token("abc"), StreamEvent::End]);
    }

    #[tokio::test]
    async fn test_eof_without_done_emits_single_end() {
        let upstream = byte_stream(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}\n",
        ]);

        let (events, outcome) = collect(relay(), upstream).await;

        assert_eq!(outcome, RelayOutcome::Completed);
        assert_eq!(events, vec![StreamEvent::token("tail"), StreamEvent::End]);
    }

    #[tokio::test]
    async fn test_trailing_record_without_newline_still_counts() {
        let upstream = byte_stream(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"last\"}}]}",
        ]);

        let (events, outcome) = collect(relay(), upstream).await;

        assert_eq!(outcome, RelayOutcome::Completed);
        assert_eq!(events, vec![StreamEvent::token("last"), StreamEvent::End]);
    }

    #[tokio::test]
    async fn test_upstream_error_emits_single_error_event() {
        let upstream: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            )),
            Err(DomainError::provider("http", "connection reset")),
        ]));

        let (events, outcome) = collect(relay(), upstream).await;

        assert_eq!(outcome, RelayOutcome::Failed);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::token("partial"));
        assert!(matches!(events[1], StreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_consecutive_parse_failures_fail_the_stream() {
        let relay = Relay::new(
            Duration::from_secs(5),
            &RelayConfig {
                max_parse_failures: 3,
            },
        );
        let upstream = byte_stream(vec![b"junk1\njunk2\njunk3\njunk4\n"]);

        let (events, outcome) = collect(relay, upstream).await;

        assert_eq!(outcome, RelayOutcome::Failed);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_valid_record_resets_failure_counter() {
        let relay = Relay::new(
            Duration::from_secs(5),
            &RelayConfig {
                max_parse_failures: 3,
            },
        );
        let upstream = byte_stream(vec![
            b"junk1\njunk2\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\njunk3\njunk4\ndata: [DONE]\n",
        ]);

        let (events, outcome) = collect(relay, upstream).await;

        assert_eq!(outcome, RelayOutcome::Completed);
        assert_eq!(events, vec![StreamEvent::token("ok"), StreamEvent::End]);
    }

    #[tokio::test]
    async fn test_connect_timeout_fails_the_stream() {
        let relay = Relay::new(Duration::from_millis(20), &RelayConfig::default());
        let upstream: ByteStream = Box::pin(futures::stream::pending());

        let (events, outcome) = collect(relay, upstream).await;

        assert_eq!(outcome, RelayOutcome::Failed);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_client_disconnect_aborts_upstream() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let upstream = byte_stream(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"into the void\"}}]}\n\ndata: [DONE]\n\n",
        ]);

        let outcome = relay().run(upstream, &tx).await;
        assert_eq!(outcome, RelayOutcome::Disconnected);
    }

    #[tokio::test]
    async fn test_token_concatenation_matches_upstream_content() {
        // Property: the joined token contents equal the upstream content with
        // metadata records removed, with no drops or duplicates.
        let upstream = byte_stream(vec![
            b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"one \"}}]}\ndata: {\"choices\":[{\"delta\":{\"content\":\"two \"}}]}\n",
            b"data: {\"choices\":[{\"delta\":{}}]}\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"three\"}}]}\ndata: [DONE]\n",
        ]);

        let (events, outcome) = collect(relay(), upstream).await;

        assert_eq!(outcome, RelayOutcome::Completed);
        let text: String = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Token { content } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "one two three");

        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1);
        assert!(events.last().unwrap().is_terminal());
    }
}
