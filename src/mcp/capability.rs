//! Capability descriptors, handler seams, and the per-module registry
//!
//! A module's tools, prompts, resources, and resource templates are supplied
//! by an [`McpService`] implementation and folded once into a
//! [`CapabilityRegistry`]. The registry is read-only afterwards, so lookups
//! need no synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptDescriptor {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDescriptor {
    pub uri_template: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// One content item inside a tool call result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ContentItem {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CallResult {
    pub content: Vec<ContentItem>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text { text: text.into() }],
            is_error: Some(false),
        }
    }
}

/// Async seam for a callable tool; one implementation per declared tool.
#[async_trait]
pub trait ToolCall: Send + Sync {
    async fn call(&self, arguments: Value) -> Result<CallResult, AppError>;
}

/// Async seam for resource and resource-template reads.
#[async_trait]
pub trait ResourceRead: Send + Sync {
    async fn read(&self, uri: &str) -> Result<String, AppError>;
}

pub struct Tool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolCall>,
}

pub struct Prompt {
    pub descriptor: PromptDescriptor,
}

pub struct Resource {
    pub descriptor: ResourceDescriptor,
    pub handler: Arc<dyn ResourceRead>,
}

pub struct ResourceTemplate {
    pub descriptor: ResourceTemplateDescriptor,
    pub handler: Arc<dyn ResourceRead>,
}

/// Collaborator interface a pluggable module implements.
pub trait McpService: Send + Sync {
    fn server_info(&self) -> ServerInfo;
    fn module(&self) -> &str;
    fn tools(&self) -> Vec<Tool>;

    fn prompts(&self) -> Vec<Prompt> {
        Vec::new()
    }

    fn resources(&self) -> Vec<Resource> {
        Vec::new()
    }

    fn resource_templates(&self) -> Vec<ResourceTemplate> {
        Vec::new()
    }
}

/// Four lookup tables built exactly once per module at initialization.
/// Duplicate names silently overwrite the earlier entry.
pub struct CapabilityRegistry {
    tools: HashMap<String, Tool>,
    prompts: HashMap<String, Prompt>,
    resources: HashMap<String, Resource>,
    templates: HashMap<String, ResourceTemplate>,
}

impl CapabilityRegistry {
    pub fn from_service(service: &dyn McpService) -> Self {
        let mut tools = HashMap::new();
        for tool in service.tools() {
            tools.insert(tool.descriptor.name.clone(), tool);
        }

        let mut prompts = HashMap::new();
        for prompt in service.prompts() {
            prompts.insert(prompt.descriptor.name.clone(), prompt);
        }

        let mut resources = HashMap::new();
        for resource in service.resources() {
            resources.insert(resource.descriptor.uri.clone(), resource);
        }

        let mut templates = HashMap::new();
        for template in service.resource_templates() {
            templates.insert(template.descriptor.name.clone(), template);
        }

        Self {
            tools,
            prompts,
            resources,
            templates,
        }
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn prompt(&self, name: &str) -> Option<&Prompt> {
        self.prompts.get(name)
    }

    pub fn resource(&self, uri: &str) -> Option<&Resource> {
        self.resources.get(uri)
    }

    /// Naive template match: strip `{`, `}`, `*` from the template and test
    /// whether the requested URI starts with what remains. First match in
    /// table-iteration order wins; the order is unspecified.
    pub fn match_template(&self, uri: &str) -> Option<&ResourceTemplate> {
        self.templates.values().find(|template| {
            let prefix: String = template
                .descriptor
                .uri_template
                .chars()
                .filter(|c| !matches!(c, '{' | '}' | '*'))
                .collect();
            uri.starts_with(&prefix)
        })
    }

    pub fn tool_descriptors(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().map(|tool| &tool.descriptor).collect()
    }

    pub fn prompt_descriptors(&self) -> Vec<&PromptDescriptor> {
        self.prompts
            .values()
            .map(|prompt| &prompt.descriptor)
            .collect()
    }

    pub fn resource_descriptors(&self) -> Vec<&ResourceDescriptor> {
        self.resources
            .values()
            .map(|resource| &resource.descriptor)
            .collect()
    }

    pub fn template_descriptors(&self) -> Vec<&ResourceTemplateDescriptor> {
        self.templates
            .values()
            .map(|template| &template.descriptor)
            .collect()
    }
}
