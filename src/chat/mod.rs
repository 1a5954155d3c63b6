// Chat conversation model
//
// Messages as the client UI sends them, with embedded tool invocation parts.

mod conversation;
mod message;

pub use conversation::Conversation;
pub use message::{
    Message, Part, Role, TextPart, ToolInvocation, ToolInvocationPart, ToolInvocationState,
};

use thiserror::Error;

/// Request-level conversation problems
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Conversation has no messages")]
    Empty,

    #[error("Message {index} references unknown tool '{tool_name}'")]
    UnknownTool { index: usize, tool_name: String },
}
