//! Module router: one protocol server per registered service
//!
//! Services are supplied as an explicit registration list at process
//! construction; there is no runtime discovery. The table is immutable after
//! startup, so lookups are lock-free shared reads.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::mcp::capability::McpService;
use crate::mcp::server::McpServer;

pub struct ModuleRouter {
    modules: HashMap<String, Arc<McpServer>>,
}

impl ModuleRouter {
    pub fn discover(services: &[Arc<dyn McpService>]) -> Self {
        let mut modules = HashMap::new();
        for service in services {
            let module = service.module().to_string();
            info!(module = %module, "initializing module server");
            modules.insert(
                module.clone(),
                Arc::new(McpServer::initialize(service.as_ref())),
            );
        }
        Self { modules }
    }

    pub fn get(&self, module: &str) -> Option<Arc<McpServer>> {
        self.modules.get(module).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
