use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod modules;
pub mod services;
pub mod stdio;

use crate::http::sse::SessionRegistry;
use modules::ModuleRouter;

#[derive(Clone)]
pub struct AppState {
    pub modules: Arc<ModuleRouter>,
    pub sessions: SessionRegistry,
    pub public_url: Arc<str>,
    pub port: u16,
}

impl AppState {
    pub fn new(modules: Arc<ModuleRouter>, public_url: &str, port: u16) -> Self {
        Self {
            modules,
            sessions: SessionRegistry::new(),
            public_url: Arc::from(public_url),
            port,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/mcp/status.json", post(http::handlers::status))
        .route("/{module}/mcp", post(http::handlers::mcp_endpoint))
        .route("/{module}/sse", get(http::sse::sse_connect))
        .route("/{module}/messages", post(http::sse::sse_messages))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
