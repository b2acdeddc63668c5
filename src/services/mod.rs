//! Bundled MCP service modules
//!
//! Each service implements [`crate::mcp::capability::McpService`] and is
//! listed in [`registered`], the explicit registration list consumed at
//! startup.

pub mod random;

use std::sync::Arc;

use crate::mcp::capability::McpService;

pub fn registered() -> Vec<Arc<dyn McpService>> {
    vec![Arc::new(random::RandomService)]
}
