// Chat agent
//
// One chat turn: resolve the gated tool calls the user has answered, then let
// the model take up to `max_steps` steps, running auto-executable tools along
// the way. Everything the client sees goes through the data stream.

mod prompt;

pub use prompt::{load_system_prompt, DEFAULT_SYSTEM_PROMPT};

use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::chat::{ChatError, Conversation};
use crate::claude::{ContentBlock, LlmProvider, Message as ModelMessage, MessageRequest};
use crate::config::ModelConfig;
use crate::stream::{DataStreamPart, DataStreamWriter, FinishReason, Usage};
use crate::tools::{ToolCallProcessor, ToolContext, ToolName, ToolRegistry};

/// Text of the error frame; details stay in the logs
pub const STREAM_ERROR_MESSAGE: &str = "An error occurred.";

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub steps: usize,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    /// Gated calls left for the user to answer
    pub pending_confirmations: Vec<String>,
}

/// A model-requested call resolved within the turn
struct ToolOutcome {
    id: String,
    result: Value,
    is_error: bool,
}

pub struct ChatAgent {
    provider: Arc<dyn LlmProvider>,
    processor: Arc<ToolCallProcessor>,
    system_prompt: String,
    model: String,
    max_steps: usize,
    max_tokens: u32,
}

impl ChatAgent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        processor: Arc<ToolCallProcessor>,
        settings: &ModelConfig,
    ) -> Self {
        Self {
            provider,
            processor,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: settings.model.clone(),
            max_steps: settings.max_steps.max(1),
            max_tokens: settings.max_tokens,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.processor.registry()
    }

    /// Request-level checks, run before any streaming starts
    pub fn validate(&self, conversation: &Conversation) -> Result<(), ChatError> {
        conversation.validate(self.registry())
    }

    /// Run a turn to completion, ending the stream with an error frame on failure
    pub async fn run(&self, conversation: Conversation, stream: DataStreamWriter) {
        match self.run_turn(&conversation, &stream).await {
            Ok(outcome) => info!(
                steps = outcome.steps,
                finish_reason = ?outcome.finish_reason,
                pending = outcome.pending_confirmations.len(),
                "Chat turn complete"
            ),
            Err(e) => {
                error!(error = %format!("{:#}", e), "Chat turn failed");
                stream.write(DataStreamPart::Error(STREAM_ERROR_MESSAGE.to_string()));
            }
        }
    }

    #[instrument(skip_all, fields(messages = conversation.len()))]
    pub async fn run_turn(
        &self,
        conversation: &Conversation,
        stream: &DataStreamWriter,
    ) -> Result<TurnOutcome> {
        let conversation = self.processor.process(conversation, stream).await?;
        let mut messages = conversation.to_model_messages();
        let tools = self.registry().definitions();

        let mut usage = Usage::default();
        let mut finish_reason = FinishReason::Unknown;
        let mut pending_confirmations = Vec::new();
        let mut steps = 0;

        while steps < self.max_steps {
            if stream.is_closed() {
                info!(steps, "Client disconnected, ending turn");
                break;
            }
            steps += 1;
            let message_id = format!("msg-{}", uuid::Uuid::new_v4().simple());
            stream.write(DataStreamPart::StartStep { message_id });

            let request = MessageRequest::new(&self.model, messages.clone())
                .with_system(&self.system_prompt)
                .with_max_tokens(self.max_tokens)
                .with_tools(tools.clone());

            debug!(step = steps, provider = self.provider.name(), "Requesting model step");
            let response = self
                .provider
                .send_message(&request)
                .await
                .with_context(|| format!("Model request failed at step {}", steps))?;

            let step_usage = Usage::from(&response.usage);
            usage = usage.add(step_usage);
            finish_reason = FinishReason::from_stop_reason(response.stop_reason.as_deref());

            let text = response.text();
            if !text.is_empty() {
                stream.write(DataStreamPart::Text(text));
            }

            let tool_uses = response.tool_uses();
            for (id, name, input) in &tool_uses {
                stream.write(DataStreamPart::ToolCall {
                    tool_call_id: id.to_string(),
                    tool_name: name.to_string(),
                    args: (*input).clone(),
                });
            }

            messages.push(ModelMessage::assistant_blocks(response.content.clone()));

            if tool_uses.is_empty() {
                stream.write(DataStreamPart::FinishStep {
                    finish_reason,
                    usage: step_usage,
                    is_continued: false,
                });
                break;
            }

            let history = Arc::new(messages.clone());
            let mut auto_calls = Vec::new();
            for (id, name, input) in &tool_uses {
                match name.parse::<ToolName>() {
                    Ok(tool) if self.processor.policy().requires_confirmation(tool) => {
                        info!(tool = %tool, tool_call_id = %id, "Awaiting user confirmation");
                        pending_confirmations.push(id.to_string());
                    }
                    _ => auto_calls.push(self.execute_auto(id, name, input, &history)),
                }
            }

            let outcomes = join_all(auto_calls).await;
            for outcome in &outcomes {
                stream.write(DataStreamPart::ToolResult {
                    tool_call_id: outcome.id.clone(),
                    result: outcome.result.clone(),
                });
            }

            stream.write(DataStreamPart::FinishStep {
                finish_reason,
                usage: step_usage,
                is_continued: false,
            });

            // The model cannot continue until every call in the step has a result
            if !pending_confirmations.is_empty() {
                break;
            }

            messages.push(ModelMessage::user_blocks(
                outcomes
                    .iter()
                    .map(|o| ContentBlock::tool_result(&o.id, &o.result, o.is_error))
                    .collect(),
            ));
        }

        stream.write(DataStreamPart::FinishMessage {
            finish_reason,
            usage,
        });

        Ok(TurnOutcome {
            steps,
            finish_reason,
            usage,
            pending_confirmations,
        })
    }

    /// Run one auto-executable call; failures become error results for the model
    async fn execute_auto(
        &self,
        id: &str,
        name: &str,
        input: &Value,
        history: &Arc<Vec<ModelMessage>>,
    ) -> ToolOutcome {
        let failed = |message: String| ToolOutcome {
            id: id.to_string(),
            result: Value::String(message),
            is_error: true,
        };

        let descriptor = match name.parse::<ToolName>() {
            Ok(tool) => self.registry().get(tool),
            Err(_) => None,
        };
        let Some(descriptor) = descriptor else {
            warn!(tool = %name, "Model requested an unknown tool");
            return failed(format!("Error: Unknown tool '{}'", name));
        };
        let Some(executor) = descriptor.executor() else {
            return failed(format!("Error: Tool '{}' cannot run without confirmation", name));
        };
        if let Err(e) = descriptor.validate_args(input) {
            warn!(tool = %name, error = %e, "Model sent invalid tool arguments");
            return failed(format!("Error: {}", e));
        }

        let context = ToolContext {
            messages: Arc::clone(history),
            tool_call_id: id.to_string(),
        };

        debug!(tool = %name, tool_call_id = %id, "Executing tool");
        match executor.execute(input.clone(), &context).await {
            Ok(result) => ToolOutcome {
                id: id.to_string(),
                result,
                is_error: false,
            },
            Err(e) => {
                error!(tool = %name, tool_call_id = %id, error = %e, "Tool execution failed");
                failed(format!("Error: {}", e))
            }
        }
    }
}
