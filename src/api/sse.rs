//! Server-Sent Events support

use super::types::SnapshotResponse;
use crate::state_machine::ConversionState;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init: ConversionState,
    broadcast_rx: tokio::sync::broadcast::Receiver<ConversionState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with the current snapshot then broadcasts
    let init = futures::stream::once(async move { Ok(snapshot_event("init", init)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(state) => Some(Ok(snapshot_event("state", state))),
        Err(_) => None, // Skip lagged messages; the next one carries the full state
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn snapshot_event(event_type: &str, state: ConversionState) -> Event {
    let data = serde_json::to_string(&SnapshotResponse::from(state)).unwrap_or_default();
    Event::default().event(event_type).data(data)
}
