//! `WebSocket` viewer feed.
//!
//! Viewers connect to `GET /ws/beacons` and immediately receive the
//! current snapshot as a JSON array, then a fresh full snapshot every
//! time a report is ingested or a sweep evicts something. Viewers send
//! nothing meaningful; inbound text and binary frames are ignored.
//!
//! Each session remembers the store version of the last snapshot it
//! sent and skips any frame that is not newer, so a viewer never steps
//! back to an older state.
//!
//! A failed send ends only that viewer's session. Other viewers keep
//! receiving from the shared broadcast channel.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use beaconwatch_types::ViewerId;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::broadcast::encode_snapshot;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` viewer session.
///
/// # Route
///
/// `GET /ws/beacons`
pub async fn ws_beacons(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| serve_viewer(socket, state))
}

/// Drive one viewer session until the viewer goes away.
///
/// Generic over the socket so sessions can be exercised without a
/// network connection.
pub async fn serve_viewer<S, E>(mut socket: S, state: Arc<AppState>)
where
    S: Stream<Item = Result<Message, E>> + Sink<Message> + Unpin,
    E: Display,
    <S as Sink<Message>>::Error: Display,
{
    let viewer = ViewerId::new();

    // Subscribe before reading the snapshot so a change landing in
    // between is still delivered.
    let mut rx = state.broadcaster.subscribe();
    debug!(%viewer, viewers = state.broadcaster.viewer_count(), "Viewer connected");

    let initial = state.store.versioned_snapshot().await;
    let mut seen = initial.version;
    match encode_snapshot(&initial.records) {
        Ok(frame) => {
            if let Err(e) = socket.send(Message::Text(frame)).await {
                debug!(%viewer, error = %e, "Viewer dropped before initial snapshot");
                return;
            }
        }
        Err(e) => warn!(%viewer, error = %e, "Failed to serialize initial snapshot"),
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(frame) if frame.version <= seen => {
                        debug!(%viewer, version = frame.version, seen, "Skipping stale snapshot");
                    }
                    Ok(frame) => {
                        seen = frame.version;
                        if let Err(e) = socket.send(Message::Text(frame.payload)).await {
                            debug!(%viewer, error = %e, "Viewer disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(%viewer, skipped, "Viewer lagged, skipping to newest snapshot");
                    }
                    Err(RecvError::Closed) => {
                        debug!(%viewer, "Broadcast channel closed, ending viewer session");
                        return;
                    }
                }
            }
            msg = socket.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%viewer, "Viewer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%viewer, "Viewer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%viewer, error = %e, "Viewer socket error");
                        return;
                    }
                    Some(Ok(_)) => {
                        // Viewers have nothing to say; ignore text, binary, pong.
                    }
                }
            }
        }
    }
}
