// Errors raised while building or consulting the tool layer

use thiserror::Error;

use crate::tools::types::ToolName;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(ToolName),

    #[error("Tool '{0}' is not registered")]
    NotRegistered(ToolName),

    #[error("Tool '{0}' executes directly and cannot take a confirmed executor")]
    NotGated(ToolName),

    #[error("Tool '{0}' already has a confirmed executor")]
    DuplicateExecutor(ToolName),

    #[error("Invalid input schema for '{tool}': {details}")]
    InvalidSchema { tool: ToolName, details: String },

    #[error("Invalid arguments for {tool}: {details}")]
    InvalidArguments { tool: ToolName, details: String },
}
