//! Tool registry for managing available tools

use crate::Tool;
use agent_core::{Error, Result};
use agent_llm::ToolDefinition;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry for managing tools
///
/// Names are unique. Listing order is sorted by name so the tool schema sent
/// to the model is stable between turns.
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            tools: RwLock::new(BTreeMap::new()),
        }
    }
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// Fails with [`Error::DuplicateTool`] if the name is already taken.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<()> {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        let name = tool.name().to_string();
        if tools.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }
        tools.insert(name, tool);
        Ok(())
    }

    /// Builder-style registration
    pub fn with_tool(self, tool: Arc<dyn Tool>) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.get(name).cloned()
    }

    /// Check whether a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.contains_key(name)
    }

    /// List all registered tools
    ///
    /// Returns a vector of all tools in the registry, sorted by name.
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.values().cloned().collect()
    }

    /// Tool definitions to send to the LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools()
            .iter()
            .map(|tool| tool.definition())
            .collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.is_empty()
    }
}
