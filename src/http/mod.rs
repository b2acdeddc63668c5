//! HTTP transport layer for the Model Context Protocol
//!
//! Two adapters share the dispatcher: the single-request Streamable HTTP
//! endpoint and the legacy two-endpoint SSE scheme.

pub mod handlers;
pub mod sse;
