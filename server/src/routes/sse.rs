use std::convert::Infallible;
use std::time::Duration;

use arcmap_shared::BoardEvent;
use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use bytes::Bytes;
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use crate::config::SSE_KEEPALIVE_SECS;
use crate::state::{AppState, PreSerializedEvent, serialize_event};

pub async fn board_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        // Subscribe before reading the snapshot so no change falls between them.
        let rx = state.event_tx.subscribe();
        if let Some((seq, json)) = current_snapshot(&state).await
            && let Some(payload) = event_payload(json.as_ref())
        {
            yield Ok(snapshot_event(seq, payload));
        }

        let mut stream = BroadcastStream::new(rx);
        while let Some(result) = stream.next().await {
            match result {
                Ok(event) => {
                    let (event_type, seq, data) = match event {
                        PreSerializedEvent::Snapshot { seq, json } => ("snapshot", seq, json),
                        PreSerializedEvent::Update { seq, json } => ("update", seq, json),
                    };
                    let Some(payload) = event_payload(data.as_ref()) else {
                        warn!(
                            seq,
                            event = event_type,
                            "event payload is not valid utf-8; dropping SSE event"
                        );
                        continue;
                    };
                    yield Ok(
                        Event::default()
                            .id(seq.to_string())
                            .event(event_type)
                            .data(payload),
                    );
                }
                Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(
                        skipped_events = skipped,
                        "SSE client lagged behind broadcast buffer; replaying snapshot"
                    );
                    let Some((seq, json)) = current_snapshot(&state).await else {
                        continue;
                    };
                    if let Some(payload) = event_payload(json.as_ref()) {
                        yield Ok(snapshot_event(seq, payload));
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
            .text("keep-alive"),
    )
}

async fn current_snapshot(state: &AppState) -> Option<(u64, std::sync::Arc<Bytes>)> {
    let board = state.board.read().await;
    let seq = state.current_seq();
    let event = BoardEvent::Snapshot {
        seq,
        board: board.snapshot(),
    };
    serialize_event(&event).map(|json| (seq, json))
}

fn snapshot_event(seq: u64, payload: &str) -> Event {
    Event::default()
        .id(seq.to_string())
        .event("snapshot")
        .data(payload)
}

fn event_payload(bytes: &Bytes) -> Option<&str> {
    std::str::from_utf8(bytes.as_ref()).ok()
}
