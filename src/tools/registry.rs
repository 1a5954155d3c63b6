// Tool registry and executor trait
//
// A descriptor without an executor is a gated tool: it never runs until the
// client supplies an approval signal for it.

use anyhow::Result;
use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::tools::types::{ToolContext, ToolDefinition, ToolInputSchema, ToolName};
use crate::tools::ToolError;

/// Something that can run a tool with validated arguments
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute the tool with given input and context
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value>;
}

/// Immutable description of one tool
pub struct ToolDescriptor {
    name: ToolName,
    description: String,
    input_schema: ToolInputSchema,
    validator: JSONSchema,
    execute: Option<Arc<dyn ToolExecutor>>,
}

impl ToolDescriptor {
    /// Create a descriptor for a gated tool
    pub fn new(
        name: ToolName,
        description: impl Into<String>,
        input_schema: ToolInputSchema,
    ) -> Result<Self, ToolError> {
        let schema_value = input_schema.to_value();
        let validator =
            JSONSchema::compile(&schema_value).map_err(|e| ToolError::InvalidSchema {
                tool: name,
                details: e.to_string(),
            })?;

        Ok(Self {
            name,
            description: description.into(),
            input_schema,
            validator,
            execute: None,
        })
    }

    /// Give the tool an execute capability, making it auto-executable
    pub fn with_execute(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.execute = Some(executor);
        self
    }

    pub fn name(&self) -> ToolName {
        self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &ToolInputSchema {
        &self.input_schema
    }

    pub fn executor(&self) -> Option<&Arc<dyn ToolExecutor>> {
        self.execute.as_ref()
    }

    pub fn is_auto_executable(&self) -> bool {
        self.execute.is_some()
    }

    /// Check arguments against the input schema
    pub fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        if let Err(errors) = self.validator.validate(args) {
            let details = errors
                .map(|error| error.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ToolError::InvalidArguments {
                tool: self.name,
                details,
            });
        }
        Ok(())
    }

    /// Get full tool definition (for Claude API)
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("auto_executable", &self.is_auto_executable())
            .finish()
    }
}

/// Registry of available tools
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, ToolDescriptor>,
}

impl ToolRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; each name may be registered once
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        let name = descriptor.name();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.tools.insert(name, descriptor);
        Ok(())
    }

    /// Get tool by name
    pub fn get(&self, name: ToolName) -> Option<&ToolDescriptor> {
        self.tools.get(&name)
    }

    /// Check if tool exists
    pub fn has_tool(&self, name: ToolName) -> bool {
        self.tools.contains_key(&name)
    }

    /// Get all tool definitions (for Claude API)
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(ToolDescriptor::definition).collect()
    }

    /// Every registered tool lacking an execute capability.
    ///
    /// Computed from the current contents on each call.
    pub fn tools_requiring_confirmation(&self) -> BTreeSet<ToolName> {
        self.tools
            .values()
            .filter(|descriptor| !descriptor.is_auto_executable())
            .map(ToolDescriptor::name)
            .collect()
    }

    /// Validate arguments for a registered tool
    pub fn validate_args(&self, name: ToolName, args: &Value) -> Result<(), ToolError> {
        self.get(name)
            .ok_or(ToolError::NotRegistered(name))?
            .validate_args(args)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
