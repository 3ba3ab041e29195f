//! Tool registry: name to capability mapping.

use crate::tool::{Tool, ToolDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry mapping tool names to invocable capabilities.
///
/// Read-only after construction; safe to share across threads.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool (builder style).
    #[must_use]
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        let id = tool.descriptor().id;
        self.tools.insert(id, Arc::new(tool));
        self
    }

    /// Add a shared tool (builder style).
    #[must_use]
    pub fn with_shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        let id = tool.descriptor().id;
        self.tools.insert(id, tool);
        self
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptors for all registered tools.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Names of tools whose descriptors require confirmation.
    ///
    /// This is the default protected set; engine configuration may
    /// override it per session.
    pub fn protected_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .values()
            .map(|t| t.descriptor())
            .filter(|d| d.requires_confirmation)
            .map(|d| d.id)
            .collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
