//! The central Model Context Protocol engine
//!
//! Parses one JSON-RPC message, routes it on the exact method string, and
//! produces an optional response. Transport adapters own the I/O; this type
//! never touches a socket or stream.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::mcp::capability::{CapabilityRegistry, McpService, PromptDescriptor, ServerInfo};
use crate::mcp::rpc::{is_json_rpc_error, json_rpc_error, json_rpc_result};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Protocol dispatcher for one module. Built exactly once per service; the
/// registry is immutable afterwards, so a shared reference serves any number
/// of concurrent transports.
pub struct McpServer {
    server_info: ServerInfo,
    module: String,
    registry: CapabilityRegistry,
}

impl McpServer {
    pub fn initialize(service: &dyn McpService) -> Self {
        Self {
            server_info: service.server_info(),
            module: service.module().to_string(),
            registry: CapabilityRegistry::from_service(service),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Handle one raw JSON-RPC message. `None` means the message was a
    /// notification and no bytes must be written anywhere.
    pub async fn handle_raw(&self, body: &[u8], session_id: &str) -> Option<String> {
        let payload: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => {
                return Some(
                    json_rpc_error(Value::Null, -32700, &format!("Parse error: {err}")).to_string(),
                )
            }
        };

        self.handle_value(payload, session_id)
            .await
            .map(|response| response.to_string())
    }

    pub async fn handle_value(&self, payload: Value, session_id: &str) -> Option<Value> {
        let id = payload.get("id").cloned();
        let method = payload
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = payload.get("params").cloned().unwrap_or(Value::Null);

        debug!(
            module = %self.module,
            method = %method,
            session_id = %session_id,
            "dispatching message"
        );

        let response = self
            .dispatch(&method, params, id.clone().unwrap_or(Value::Null))
            .await;

        info!(
            module = %self.module,
            method = %method,
            outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
            "mcp request handled"
        );

        // A message without an id is a notification: whatever branch ran,
        // nothing goes back to the client.
        id.map(|_| response)
    }

    async fn dispatch(&self, method: &str, params: Value, id: Value) -> Value {
        match method {
            "initialize" => json_rpc_result(id, self.initialize_result()),
            // Acknowledged but otherwise inert; cancellation never interrupts
            // a running handler.
            "initialized" | "notifications/initialized" | "notifications/cancelled" => {
                json_rpc_result(id, json!({}))
            }
            "tools/list" => {
                json_rpc_result(id, json!({"tools": self.registry.tool_descriptors()}))
            }
            "prompts/list" => {
                json_rpc_result(id, json!({"prompts": self.registry.prompt_descriptors()}))
            }
            "resources/list" => {
                json_rpc_result(id, json!({"resources": self.registry.resource_descriptors()}))
            }
            "resources/templates/list" => json_rpc_result(
                id,
                json!({"resourceTemplates": self.registry.template_descriptors()}),
            ),
            "tools/call" => self.tools_call(params, id).await,
            "prompts/get" => self.prompts_get(params, id),
            "resources/read" => self.resources_read(params, id).await,
            "resources/templates/read" => self.templates_read(params, id).await,
            "ping" => json_rpc_result(id, json!({})),
            other => json_rpc_error(id, -32601, &format!("Method not found: {other}")),
        }
    }

    fn initialize_result(&self) -> Value {
        // The client's offered protocolVersion is not validated.
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.server_info.name,
                "version": self.server_info.version
            },
            "capabilities": {
                "tools": {},
                "prompts": {},
                "resources": {},
                "resourceTemplates": {}
            }
        })
    }

    async fn tools_call(&self, params: Value, id: Value) -> Value {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(tool) = self.registry.tool(name) else {
            return json_rpc_error(id, -32602, &format!("Unknown tool: {name}"));
        };

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        match tool.handler.call(arguments).await {
            Ok(result) => json_rpc_result(
                id,
                serde_json::to_value(result).expect("call result serialization"),
            ),
            Err(err) => json_rpc_error(id, -32603, &format!("Tool execution error: {err}")),
        }
    }

    fn prompts_get(&self, params: Value, id: Value) -> Value {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(prompt) = self.registry.prompt(name) else {
            return json_rpc_error(id, -32602, &format!("Unknown prompt: {name}"));
        };

        json_rpc_result(
            id,
            json!({
                "description": prompt.descriptor.description,
                "messages": [{
                    "role": "user",
                    "content": {
                        "type": "text",
                        "text": render_prompt(&prompt.descriptor)
                    }
                }]
            }),
        )
    }

    async fn resources_read(&self, params: Value, id: Value) -> Value {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(resource) = self.registry.resource(uri) else {
            return json_rpc_error(id, -32602, &format!("Unknown resource: {uri}"));
        };

        match resource.handler.read(uri).await {
            Ok(text) => json_rpc_result(
                id,
                json!({
                    "contents": [{
                        "uri": uri,
                        "mimeType": resource.descriptor.mime_type,
                        "text": text
                    }]
                }),
            ),
            Err(err) => json_rpc_error(id, -32603, &format!("Resource read error: {err}")),
        }
    }

    async fn templates_read(&self, params: Value, id: Value) -> Value {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(template) = self.registry.match_template(uri) else {
            return json_rpc_error(id, -32602, &format!("No resource template matches: {uri}"));
        };

        match template.handler.read(uri).await {
            Ok(text) => json_rpc_result(
                id,
                json!({
                    "contents": [{
                        "uri": uri,
                        "mimeType": template.descriptor.mime_type,
                        "text": text
                    }]
                }),
            ),
            Err(err) => json_rpc_error(id, -32603, &format!("Resource read error: {err}")),
        }
    }
}

/// Fixed textual rendering of a prompt; deliberately not a templating engine.
fn render_prompt(descriptor: &PromptDescriptor) -> String {
    let mut text = format!(
        "Prompt: {}\nDescription: {}",
        descriptor.name, descriptor.description
    );
    if !descriptor.arguments.is_empty() {
        text.push_str("\nArguments:");
        for argument in &descriptor.arguments {
            let requirement = if argument.required {
                "required"
            } else {
                "optional"
            };
            text.push_str(&format!(
                "\n- {} ({}): {}",
                argument.name, requirement, argument.description
            ));
        }
    }
    text
}
