//! Random-number service module
//!
//! Exposes a `generateRandom` tool drawing a uniform integer in `[0, bound)`,
//! a matching prompt, a configuration resource, and a draw-by-URI resource
//! template.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::mcp::capability::{
    CallResult, McpService, Prompt, PromptArgument, PromptDescriptor, Resource,
    ResourceDescriptor, ResourceRead, ResourceTemplate, ResourceTemplateDescriptor, ServerInfo,
    Tool, ToolCall, ToolDescriptor,
};

pub struct RandomService;

struct GenerateRandom;

#[async_trait]
impl ToolCall for GenerateRandom {
    async fn call(&self, arguments: Value) -> Result<CallResult, AppError> {
        let bound = arguments
            .get("bound")
            .and_then(Value::as_i64)
            .ok_or_else(|| AppError::bad_request("bound is required and must be an integer"))?;
        if bound <= 0 {
            return Err(AppError::bad_request("bound must be a positive integer"));
        }

        let drawn = rand::thread_rng().gen_range(0..bound);
        Ok(CallResult::text(drawn.to_string()))
    }
}

struct GeneratorConfig;

#[async_trait]
impl ResourceRead for GeneratorConfig {
    async fn read(&self, _uri: &str) -> Result<String, AppError> {
        Ok(json!({"distribution": "uniform", "maxBound": i64::MAX}).to_string())
    }
}

/// Reads `random://draws/{bound}`: the trailing path segment is the
/// exclusive upper bound of a single draw.
struct DrawByUri;

#[async_trait]
impl ResourceRead for DrawByUri {
    async fn read(&self, uri: &str) -> Result<String, AppError> {
        let bound = uri
            .rsplit('/')
            .next()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|bound| *bound > 0)
            .ok_or_else(|| AppError::bad_request("draw bound must be a positive integer"))?;

        Ok(rand::thread_rng().gen_range(0..bound).to_string())
    }
}

impl McpService for RandomService {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: "mcp-random-server".to_string(),
            version: "1.0.0".to_string(),
        }
    }

    fn module(&self) -> &str {
        "random"
    }

    fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            descriptor: ToolDescriptor {
                name: "generateRandom".to_string(),
                description: "Generate a uniform random integer in [0, bound)".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "bound": {
                            "type": "integer",
                            "description": "Exclusive upper bound; must be positive"
                        }
                    },
                    "required": ["bound"]
                }),
            },
            handler: Arc::new(GenerateRandom),
        }]
    }

    fn prompts(&self) -> Vec<Prompt> {
        vec![Prompt {
            descriptor: PromptDescriptor {
                name: "generateRandom".to_string(),
                description: "Ask for a random number below a bound".to_string(),
                arguments: vec![PromptArgument {
                    name: "bound".to_string(),
                    description: "Exclusive upper bound of the draw".to_string(),
                    required: true,
                }],
            },
        }]
    }

    fn resources(&self) -> Vec<Resource> {
        vec![Resource {
            descriptor: ResourceDescriptor {
                uri: "random://config".to_string(),
                name: "generator-config".to_string(),
                description: "Generator configuration".to_string(),
                mime_type: "application/json".to_string(),
            },
            handler: Arc::new(GeneratorConfig),
        }]
    }

    fn resource_templates(&self) -> Vec<ResourceTemplate> {
        vec![ResourceTemplate {
            descriptor: ResourceTemplateDescriptor {
                uri_template: "random://draws/{*}".to_string(),
                name: "draw-by-uri".to_string(),
                description: "One draw below the bound named in the URI".to_string(),
                mime_type: "text/plain".to_string(),
            },
            handler: Arc::new(DrawByUri),
        }]
    }
}
