// Ordered conversation with shared, immutable earlier messages

use std::sync::Arc;

use crate::chat::message::{Message, Part, Role, ToolInvocationState};
use crate::chat::ChatError;
use crate::claude::{ContentBlock, Message as ModelMessage};
use crate::tools::{ToolName, ToolRegistry};

/// A conversation as supplied by one chat request.
///
/// Updates never mutate in place: `with_last_replaced` returns a new list whose
/// earlier entries point at the same messages as before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Arc<Message>>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages: messages.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn messages(&self) -> &[Arc<Message>] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Arc<Message>> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// New conversation with the last message swapped for `message`
    pub fn with_last_replaced(&self, message: Message) -> Self {
        let mut messages = self.messages.clone();
        match messages.last_mut() {
            Some(last) => *last = Arc::new(message),
            None => messages.push(Arc::new(message)),
        }
        Self { messages }
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages.into_iter().map(Arc::unwrap_or_clone).collect()
    }

    /// Check the request-level invariants: at least one message, and every
    /// tool invocation names a registered tool.
    pub fn validate(&self, registry: &ToolRegistry) -> Result<(), ChatError> {
        if self.messages.is_empty() {
            return Err(ChatError::Empty);
        }

        for (index, message) in self.messages.iter().enumerate() {
            for invocation in message.tool_invocations() {
                let known = invocation
                    .tool_name
                    .parse::<ToolName>()
                    .map(|name| registry.has_tool(name))
                    .unwrap_or(false);
                if !known {
                    return Err(ChatError::UnknownTool {
                        index,
                        tool_name: invocation.tool_name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Convert to Claude API messages.
    ///
    /// Resolved tool invocations become a `tool_use` block in the assistant
    /// turn followed by a user turn carrying the matching `tool_result`.
    /// Invocations still waiting on a result are left out.
    pub fn to_model_messages(&self) -> Vec<ModelMessage> {
        let mut out = Vec::new();

        for message in &self.messages {
            match message.role {
                Role::User => {
                    let text = message.text();
                    if !text.is_empty() {
                        out.push(ModelMessage::user(text));
                    }
                }
                Role::Assistant => push_assistant(&mut out, message),
            }
        }

        out
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}

fn push_assistant(out: &mut Vec<ModelMessage>, message: &Message) {
    let Some(parts) = &message.parts else {
        if !message.content.is_empty() {
            out.push(ModelMessage::assistant(message.content.clone()));
        }
        return;
    };

    let mut step = StepBlocks::default();

    for part in parts {
        match part {
            Part::Text(text) => {
                // Text after tool results belongs to the next model step
                if !step.results.is_empty() {
                    step.flush(out);
                }
                if !text.text.is_empty() {
                    step.blocks.push(ContentBlock::text(&text.text));
                }
            }
            Part::ToolInvocation(part) => {
                let invocation = &part.tool_invocation;
                let result = match (&invocation.state, &invocation.result) {
                    (ToolInvocationState::Result, Some(result)) => result,
                    _ => continue,
                };

                let input = if invocation.args.is_null() {
                    serde_json::json!({})
                } else {
                    invocation.args.clone()
                };
                step.blocks.push(ContentBlock::ToolUse {
                    id: invocation.tool_call_id.clone(),
                    name: invocation.tool_name.clone(),
                    input,
                });
                step.results.push(ContentBlock::tool_result(
                    &invocation.tool_call_id,
                    result,
                    false,
                ));
            }
            Part::Other(_) if part.is_step_start() && !step.results.is_empty() => {
                step.flush(out);
            }
            Part::Other(_) => {}
        }
    }

    step.flush(out);
}

#[derive(Default)]
struct StepBlocks {
    blocks: Vec<ContentBlock>,
    results: Vec<ContentBlock>,
}

impl StepBlocks {
    fn flush(&mut self, out: &mut Vec<ModelMessage>) {
        if !self.blocks.is_empty() {
            out.push(ModelMessage::assistant_blocks(std::mem::take(&mut self.blocks)));
        }
        if !self.results.is_empty() {
            out.push(ModelMessage::user_blocks(std::mem::take(&mut self.results)));
        }
    }
}
