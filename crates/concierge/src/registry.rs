use std::collections::{HashMap, HashSet};

use crate::errors::RegistryError;
use crate::models::tool::{Tool, ToolDefinition};

/// Named tool definitions, kept in registration order.
///
/// Built once at startup and then shared read-only behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), RegistryError> {
        if self.index.contains_key(definition.name()) {
            return Err(RegistryError::DuplicateName(definition.name().to_string()));
        }

        let mut seen = HashSet::new();
        for parameter in definition.parameters() {
            if !seen.insert(parameter.name.as_str()) {
                return Err(RegistryError::DuplicateParameter {
                    tool: definition.name().to_string(),
                    parameter: parameter.name.clone(),
                });
            }
        }

        self.index
            .insert(definition.name().to_string(), self.tools.len());
        self.tools.push(definition);
        Ok(())
    }

    /// Register several definitions, stopping at the first failure
    pub fn register_all<I>(&mut self, definitions: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = ToolDefinition>,
    {
        definitions
            .into_iter()
            .try_for_each(|definition| self.register(definition))
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Catalog entries advertised to the orchestrator
    pub fn catalog(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolDefinition::to_tool).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
