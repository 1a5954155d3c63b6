// Tool layer for the grievance assistant
//
// Tools the model may call, the confirmation gate in front of the ones with
// side effects, and the processor that resolves gated calls once the user
// has answered.

pub mod approval;
mod error;
pub mod implementations;
pub mod policy;
pub mod processor;
pub mod registry;
pub mod types;

pub use approval::{
    ApprovalSignal, APPROVAL_NO, APPROVAL_YES, DENIED_RESULT, MISSING_EXECUTOR_RESULT,
};
pub use error::ToolError;
pub use policy::{ConfirmationPolicy, Decision};
pub use processor::{FailurePolicy, ToolCallProcessor};
pub use registry::{ToolDescriptor, ToolExecutor, ToolRegistry};
pub use types::{ToolContext, ToolDefinition, ToolInputSchema, ToolName};
