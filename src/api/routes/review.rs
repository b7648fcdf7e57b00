//! Streaming review endpoints
//!
//! Both handlers resolve content, sanitize it, build the mode prompt, and
//! relay the provider's token stream to the client over SSE. Failures before
//! the first event are ordinary JSON errors; after that they become a single
//! terminal `error` record.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{AnalyzeRepoRequestBody, ApiError, ReviewRequestBody, StreamRecord};
use crate::domain::{ContentSource, DomainError, ReviewMode, StreamEvent};
use crate::infrastructure::prompt::build_prompt;
use crate::infrastructure::relay::{Relay, RelayOutcome};
use crate::infrastructure::sanitizer::sanitize;

const DEFAULT_MODE: ReviewMode = ReviewMode::Bugs;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// POST /api/review
pub async fn review(
    State(state): State<AppState>,
    Json(body): Json<ReviewRequestBody>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    let result = prepare_review(&state, body, &request_id).await;
    finish_or_stream(state, result, request_id, start).await
}

/// POST /api/analyze-repo
pub async fn analyze_repo(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRepoRequestBody>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    let result = prepare_repo_analysis(&state, body, &request_id).await;
    finish_or_stream(state, result, request_id, start).await
}

async fn prepare_review(
    state: &AppState,
    body: ReviewRequestBody,
    request_id: &str,
) -> Result<String, DomainError> {
    let mode = parse_mode(body.mode.as_deref())?;
    let source = ContentSource::from_fields(body.code, body.url, body.urls)?;

    let content = match source {
        ContentSource::Pasted(code) => {
            let max = state.config.fetch.max_file_bytes;
            if code.len() > max {
                return Err(DomainError::validation(format!(
                    "Code exceeds the maximum size of {} bytes",
                    max
                )));
            }
            info!(request_id, mode = %mode, source = "pasted", bytes = code.len(), "Review request");
            format!("// Provided code snippet\n{}", code)
        }
        ContentSource::Files(urls) => {
            info!(request_id, mode = %mode, source = "files", count = urls.len(), "Review request");
            state.fetcher.fetch_files(&urls).await?
        }
    };

    Ok(build_prompt(mode, &sanitize(&content)))
}

async fn prepare_repo_analysis(
    state: &AppState,
    body: AnalyzeRepoRequestBody,
    request_id: &str,
) -> Result<String, DomainError> {
    let mode = parse_mode(body.mode.as_deref())?;
    let repository_url = body
        .repository_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| DomainError::validation("Provide 'repository_url'"))?;

    info!(request_id, mode = %mode, repository = %repository_url, "Repo analysis request");
    let readme = state.fetcher.fetch_repo_readme(&repository_url).await?;

    Ok(build_prompt(mode, &sanitize(&readme)))
}

fn parse_mode(mode: Option<&str>) -> Result<ReviewMode, DomainError> {
    match mode {
        None => Ok(DEFAULT_MODE),
        Some(raw) => raw.parse(),
    }
}

/// Record a pre-stream failure, or open the upstream stream and hand it to
/// the relay.
async fn finish_or_stream(
    state: AppState,
    prepared: Result<String, DomainError>,
    request_id: String,
    start: Instant,
) -> Result<Response, ApiError> {
    let prompt = match prepared {
        Ok(prompt) => prompt,
        Err(e) => {
            state.metrics.record_request(false, Some(start.elapsed()));
            return Err(ApiError::from(e).with_request_id(request_id));
        }
    };

    let connect_timeout = Duration::from_secs(state.config.provider.connect_timeout_secs);

    // The request itself is bounded by the connect timeout; the relay applies
    // the same bound again to the first body byte.
    let upstream = match tokio::time::timeout(connect_timeout, state.provider.open_stream(&prompt))
        .await
    {
        Ok(Ok(upstream)) => upstream,
        Ok(Err(e)) => {
            warn!(request_id = %request_id, error = %e, "Failed to open upstream stream");
            state.metrics.record_request(false, Some(start.elapsed()));
            return Err(ApiError::from(e).with_request_id(request_id));
        }
        Err(_) => {
            warn!(request_id = %request_id, "Provider did not respond within the connect window");
            state.metrics.record_request(false, Some(start.elapsed()));
            return Err(ApiError::from(DomainError::upstream_timeout(
                "Provider did not respond within the connect window",
            ))
            .with_request_id(request_id));
        }
    };

    let relay = Relay::new(connect_timeout, &state.config.relay);
    let (tx, rx) = mpsc::channel::<StreamEvent>(EVENT_CHANNEL_CAPACITY);

    let metrics = state.metrics.clone();
    metrics.stream_started();

    tokio::spawn(async move {
        let outcome = relay.run(upstream, &tx).await;
        let elapsed = start.elapsed();
        match outcome {
            RelayOutcome::Completed => metrics.record_request(true, Some(elapsed)),
            RelayOutcome::Failed => metrics.record_request(false, Some(elapsed)),
            RelayOutcome::Disconnected => {
                debug!(request_id = %request_id, "Client disconnected mid-stream");
                metrics.record_request(false, Some(elapsed));
            }
        }
        metrics.stream_finished();
    });

    Ok(sse_response(rx))
}

/// Map normalized stream events onto the wire: one `data:` record per event,
/// with a literal `[DONE]` after a normal end and nothing after an error.
fn sse_response(rx: mpsc::Receiver<StreamEvent>) -> Response {
    let stream = ReceiverStream::new(rx).flat_map(|event| {
        let mut out: Vec<Result<Event, Infallible>> = Vec::with_capacity(2);

        match Event::default().json_data(StreamRecord::from_event(&event)) {
            Ok(record) => out.push(Ok(record)),
            Err(e) => warn!(error = %e, "Failed to serialize stream record"),
        }

        if matches!(event, StreamEvent::End) {
            out.push(Ok(Event::default().data("[DONE]")));
        }

        futures::stream::iter(out)
    });

    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    // Tell nginx-style proxies not to buffer the event stream.
    headers.insert("X-Accel-Buffering", HeaderValue::from_static("no"));

    response
}
