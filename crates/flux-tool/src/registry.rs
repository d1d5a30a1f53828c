use std::collections::HashMap;
use std::sync::Arc;

use flux_core::Tool;

/// Looks tools up by id. Lets a caller assembling a workflow keep its
/// node/tool wiring data-driven (e.g. a config file naming tools by id)
/// instead of hard-coding `Arc<dyn Tool>` construction at each call site.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Register a tool. Returns an error if its id is already taken.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let id = tool.id().to_string();
        if self.tools.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        self.tools.insert(id, Arc::new(tool));
        Ok(())
    }

    /// Look up a tool by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool with id '{0}' is already registered")]
    DuplicateId(String),
}
