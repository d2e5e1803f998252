//! Streaming utilities for Server-Sent Events (SSE)
//!
//! Contains utilities for streaming workflow snapshots to clients.

use crate::error::AppError;
use crate::orchestrator::constants::{SSE_DONE_SIGNAL, SSE_ERROR_PREFIX};
use crate::orchestrator::state::{WorkflowState, WorkflowStatus};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{stream::Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Build an SSE response from a stream of event payloads
///
/// Each item becomes one `data:` event; errors are sent with the
/// `[ERROR]` prefix.
pub fn sse_response(
    stream: impl Stream<Item = Result<String, axum::Error>> + Send + 'static,
) -> Result<Response, AppError> {
    let sse_stream = stream.map(|event_result| {
        let sse_text = match event_result {
            Ok(data) => format!("data: {}\n\n", data),
            Err(e) => format!("data: {} {}\n\n", SSE_ERROR_PREFIX, e),
        };
        Ok::<_, std::io::Error>(sse_text)
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(sse_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

/// Stream workflow snapshots as JSON
///
/// Starts with the current snapshot and emits one per observed transition.
/// Intermediate snapshots may be coalesced when the client is slow. Ends
/// with `[DONE]` once the workflow is done, or silently if it is discarded.
pub fn workflow_events(
    rx: watch::Receiver<WorkflowState>,
) -> impl Stream<Item = Result<String, axum::Error>> {
    use async_stream::stream;

    stream! {
        let mut updates = WatchStream::new(rx);

        while let Some(snapshot) = updates.next().await {
            let done = snapshot.status == WorkflowStatus::Done;
            match serde_json::to_string(&snapshot) {
                Ok(json) => yield Ok(json),
                Err(e) => {
                    yield Err(axum::Error::new(e));
                    break;
                }
            }
            if done {
                yield Ok(SSE_DONE_SIGNAL.to_string());
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_stream_ends_with_done_signal() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        state.status = WorkflowStatus::Done;
        let (_tx, rx) = watch::channel(state);

        let events: Vec<String> = workflow_events(rx)
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(events[0].contains("\"status\":\"done\""));
        assert_eq!(events[1], SSE_DONE_SIGNAL);
    }

    #[tokio::test]
    async fn test_stream_ends_when_workflow_dropped() {
        let (tx, rx) = watch::channel(WorkflowState::new(Uuid::new_v4()));
        drop(tx);

        let events: Vec<_> = workflow_events(rx).collect().await;
        assert_eq!(events.len(), 1);
    }
}
