//! Streamable HTTP transport adapter and the process-wide status endpoint
//!
//! Each POST to `/{module}/mcp` carries exactly one JSON-RPC message. The
//! session id is taken from the `Mcp-Session-Id` request header or minted
//! fresh, and is always echoed back. Clients that accept `text/event-stream`
//! get the single response wrapped as one SSE `message` event.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::stream;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::AppState;

pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

pub async fn mcp_endpoint(
    State(state): State<AppState>,
    Path(module): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(server) = state.modules.get(&module) else {
        return module_not_found(&module);
    };

    let session_id = headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let wants_sse = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"));

    match server.handle_raw(&body, &session_id).await {
        // Notification: always 202 with an empty body.
        None => (
            StatusCode::ACCEPTED,
            [(MCP_SESSION_ID_HEADER, session_id)],
        )
            .into_response(),
        Some(payload) if wants_sse => {
            let event = Event::default().event("message").data(payload);
            (
                [(MCP_SESSION_ID_HEADER, session_id)],
                Sse::new(stream::iter([Ok::<_, Infallible>(event)])),
            )
                .into_response()
        }
        Some(payload) => (
            StatusCode::OK,
            [
                (MCP_SESSION_ID_HEADER, session_id),
                (
                    header::CONTENT_TYPE.as_str(),
                    "application/json".to_string(),
                ),
            ],
            payload,
        )
            .into_response(),
    }
}

/// Liveness probe, independent of any module.
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "modules": state.modules.names(),
    }))
}

pub(crate) fn module_not_found(module: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("Module not found: {module}")})),
    )
        .into_response()
}
