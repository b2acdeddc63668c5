//! Legacy SSE transport adapter and the session registry
//!
//! `GET /{module}/sse` opens a long-lived event stream: the first frame is an
//! `endpoint` event naming the URL the client must POST follow-ups to, with
//! the freshly minted session id embedded as a query parameter. Responses to
//! those POSTs travel back over the GET stream as `message` events; the POST
//! itself only ever gets a fixed 202 acknowledgment.
//!
//! Per-session writes are serialized by construction: POST handlers enqueue
//! into the session's channel and only the response-stream task writes
//! frames, so keepalives and forwarded messages never interleave.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::http::handlers::module_not_found;
use crate::AppState;

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);
const SESSION_CHANNEL_CAPACITY: usize = 32;

/// Concurrent table of open SSE sessions. Safe for unsynchronized get,
/// insert, and remove from any task.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, mpsc::Sender<Event>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a session and return its id together with the receiving end of
    /// its sink. The caller owns the receiver for the session's lifetime.
    pub fn open(&self) -> (String, mpsc::Receiver<Event>) {
        let session_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        self.sessions.insert(session_id.clone(), tx);
        (session_id, rx)
    }

    pub fn is_open(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Remove the session; its GET stream ends once the sender is dropped.
    pub fn close(&self, session_id: &str) {
        if self.sessions.remove(session_id).is_some() {
            debug!(session_id = %session_id, "sse session closed");
        }
    }

    /// Push a `message` event onto the session's GET stream. Sends to an
    /// unknown or closed session are no-ops; returns whether delivery
    /// happened.
    pub async fn send_message(&self, session_id: &str, payload: String) -> bool {
        let Some(sender) = self
            .sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
        else {
            return false;
        };
        sender
            .send(Event::default().event("message").data(payload))
            .await
            .is_ok()
    }

    pub fn open_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Removes the session when the GET response stream is dropped, whether by
/// client disconnect or server shutdown.
struct SessionGuard {
    session_id: String,
    registry: SessionRegistry,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.close(&self.session_id);
    }
}

pub async fn sse_connect(
    State(state): State<AppState>,
    Path(module): Path<String>,
) -> Response {
    if state.modules.get(&module).is_none() {
        return module_not_found(&module);
    }

    let (session_id, rx) = state.sessions.open();
    info!(module = %module, session_id = %session_id, "sse session opened");

    let endpoint_url = format!(
        "{}/{}/messages?sessionId={}",
        state.public_url, module, session_id
    );
    let endpoint_event = Event::default().event("endpoint").data(endpoint_url);

    let guard = SessionGuard {
        session_id,
        registry: state.sessions.clone(),
    };
    let forwarded = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv()
            .await
            .map(|event| (Ok::<_, Infallible>(event), (rx, guard)))
    });
    let events = stream::iter([Ok::<_, Infallible>(endpoint_event)]).chain(forwarded);

    Sse::new(events)
        .keep_alive(
            KeepAlive::new()
                .interval(KEEPALIVE_INTERVAL)
                .text("keepalive"),
        )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

pub async fn sse_messages(
    State(state): State<AppState>,
    Path(module): Path<String>,
    Query(query): Query<MessagesQuery>,
    body: Bytes,
) -> Response {
    let Some(server) = state.modules.get(&module) else {
        return module_not_found(&module);
    };

    let Some(session_id) = query.session_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing sessionId parameter"})),
        )
            .into_response();
    };

    if !state.sessions.is_open(&session_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("Session not found: {session_id}")})),
        )
            .into_response();
    }

    // The protocol response travels over the paired GET stream; this POST
    // only ever acknowledges receipt.
    if let Some(response) = server.handle_raw(&body, &session_id).await {
        if !state.sessions.send_message(&session_id, response).await {
            warn!(session_id = %session_id, "session closed before response delivery");
        }
    }

    (StatusCode::ACCEPTED, Json(json!({"status": "accepted"}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_sessions_accept_messages_until_closed() {
        let registry = SessionRegistry::new();
        let (session_id, mut rx) = registry.open();
        assert!(registry.is_open(&session_id));
        assert_eq!(registry.open_count(), 1);

        assert!(registry.send_message(&session_id, "{}".to_string()).await);
        assert!(rx.recv().await.is_some());

        registry.close(&session_id);
        assert!(!registry.is_open(&session_id));
        assert!(!registry.send_message(&session_id, "{}".to_string()).await);
        // Sender dropped on close: the stream side observes end-of-channel.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn sends_to_unknown_sessions_are_no_ops() {
        let registry = SessionRegistry::new();
        assert!(!registry.send_message("nope", "{}".to_string()).await);
    }

    #[tokio::test]
    async fn session_ids_are_unique() {
        let registry = SessionRegistry::new();
        let (first, _rx1) = registry.open();
        let (second, _rx2) = registry.open();
        assert_ne!(first, second);
        assert_eq!(registry.open_count(), 2);
    }

    #[tokio::test]
    async fn guard_drop_removes_the_session() {
        let registry = SessionRegistry::new();
        let (session_id, _rx) = registry.open();
        {
            let _guard = SessionGuard {
                session_id: session_id.clone(),
                registry: registry.clone(),
            };
        }
        assert!(!registry.is_open(&session_id));
    }
}
