//! Tool registration.
//!
//! Schemas are compiled once, when a tool is registered. The registry is
//! built at startup and only read afterwards.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::core::{ToolDefinition, ToolDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("tool '{name}' has an invalid input schema: {message}")]
    InvalidSchema { name: String, message: String },
}

/// A tool plus its compiled argument validator.
pub struct RegisteredTool {
    pub(crate) definition: ToolDefinition,
    pub(crate) validator: jsonschema::Validator,
}

impl RegisteredTool {
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }
}

/// Tools by name, listed in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique and schemas must compile.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), RegistryError> {
        if self.index.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name));
        }
        let validator = jsonschema::validator_for(&definition.input_schema).map_err(|e| {
            RegistryError::InvalidSchema {
                name: definition.name.clone(),
                message: e.to_string(),
            }
        })?;
        debug!("Registered tool: {}", definition.name);
        self.index.insert(definition.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            definition,
            validator,
        });
        Ok(())
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, definition: ToolDefinition) -> Result<Self, RegistryError> {
        self.register(definition)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.definition.descriptor()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .map(|t| t.definition.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::{FnHandler, ToolError};
    use serde_json::{Value, json};

    fn echo(name: &str, schema: Value) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "echo",
            schema,
            FnHandler::new(|v: Value| async move { Ok::<_, ToolError>(v) }),
        )
    }

    #[test]
    fn keeps_registration_order() {
        let registry = ToolRegistry::new()
            .with(echo("b", json!({"type": "object"})))
            .unwrap()
            .with(echo("a", json!({"type": "object"})))
            .unwrap();
        assert_eq!(registry.names(), ["b", "a"]);
        assert!(registry.get("a").is_some());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", json!({"type": "object"}))).unwrap();
        assert_eq!(
            registry.register(echo("a", json!({"type": "object"}))),
            Err(RegistryError::DuplicateTool("a".into()))
        );
    }

    #[test]
    fn rejects_invalid_schema() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register(echo("bad", json!({"type": "not-a-type"})))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }
}
