// Tool call processor
//
// Resolves confirmation-gated tool invocations in the last message of a
// conversation: runs approved ones, answers denied ones, accepts UI-produced
// results, and streams each resolution as soon as it is ready.

use anyhow::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::chat::{Conversation, Part, ToolInvocation};
use crate::claude::Message as ModelMessage;
use crate::stream::{DataStreamPart, DataStreamWriter};
use crate::tools::approval::{DENIED_RESULT, MISSING_EXECUTOR_RESULT};
use crate::tools::policy::{ConfirmationPolicy, Decision};
use crate::tools::registry::{ToolExecutor, ToolRegistry};
use crate::tools::types::{ToolContext, ToolName};
use crate::tools::ToolError;

/// What happens when an approved tool's executor fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Resolve the invocation to an error string and carry on
    #[default]
    Isolate,
    /// Abort the turn with the executor's error
    FailFast,
}

pub struct ToolCallProcessor {
    registry: Arc<ToolRegistry>,
    policy: ConfirmationPolicy,
    executors: HashMap<ToolName, Arc<dyn ToolExecutor>>,
    failure_policy: FailurePolicy,
}

impl ToolCallProcessor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        let policy = ConfirmationPolicy::from_registry(&registry);
        Self {
            registry,
            policy,
            executors: HashMap::new(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Register what runs once the user confirms `name`.
    ///
    /// Only registered, gated tools accept an executor.
    pub fn register_executor(
        &mut self,
        name: ToolName,
        executor: Arc<dyn ToolExecutor>,
    ) -> Result<(), ToolError> {
        if !self.registry.has_tool(name) {
            return Err(ToolError::NotRegistered(name));
        }
        if !self.policy.requires_confirmation(name) {
            return Err(ToolError::NotGated(name));
        }
        if self.executors.contains_key(&name) {
            return Err(ToolError::DuplicateExecutor(name));
        }
        self.executors.insert(name, executor);
        Ok(())
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Process the last message's tool invocations.
    ///
    /// Returns the conversation with only the last message replaced; when
    /// nothing needs resolving the input is returned as is. Parts are handled
    /// concurrently and each resolution is written to `stream` when ready.
    /// Under `FailFast` the first failure is returned after all parts finish.
    #[instrument(skip_all, fields(messages = conversation.len()))]
    pub async fn process(
        &self,
        conversation: &Conversation,
        stream: &DataStreamWriter,
    ) -> Result<Conversation> {
        let Some(last) = conversation.last() else {
            return Ok(conversation.clone());
        };
        let Some(parts) = last.parts.as_ref() else {
            return Ok(conversation.clone());
        };

        let decisions: Vec<Decision> = parts
            .iter()
            .map(|part| {
                part.tool_invocation()
                    .map_or(Decision::PassThrough, |invocation| self.policy.decide(invocation))
            })
            .collect();

        if decisions.iter().all(|d| *d == Decision::PassThrough) {
            debug!("No gated tool invocations to resolve");
            return Ok(conversation.clone());
        }

        let needs_history = decisions.iter().any(|d| matches!(d, Decision::Execute(_)));
        let history = Arc::new(if needs_history {
            conversation.to_model_messages()
        } else {
            Vec::new()
        });

        // Every part settles before an error is reported so no started
        // executor is dropped mid-flight.
        let processed = join_all(
            parts
                .iter()
                .zip(decisions)
                .map(|(part, decision)| self.process_part(part, decision, &history, stream)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<Part>>>()?;

        let mut message = last.as_ref().clone();
        message.parts = Some(processed);
        Ok(conversation.with_last_replaced(message))
    }

    async fn process_part(
        &self,
        part: &Part,
        decision: Decision,
        history: &Arc<Vec<ModelMessage>>,
        stream: &DataStreamWriter,
    ) -> Result<Part> {
        let Part::ToolInvocation(invocation_part) = part else {
            return Ok(part.clone());
        };
        let invocation = &invocation_part.tool_invocation;

        let result = match decision {
            Decision::PassThrough => return Ok(part.clone()),
            Decision::Execute(name) => self.execute_confirmed(name, invocation, history).await?,
            Decision::Deny => {
                info!(
                    tool = %invocation.tool_name,
                    tool_call_id = %invocation.tool_call_id,
                    "User denied tool execution"
                );
                Value::String(DENIED_RESULT.to_string())
            }
            Decision::AcceptUiResult(result) => {
                debug!(
                    tool = %invocation.tool_name,
                    tool_call_id = %invocation.tool_call_id,
                    "Accepting UI-produced result"
                );
                result
            }
        };

        stream.write(DataStreamPart::ToolResult {
            tool_call_id: invocation.tool_call_id.clone(),
            result: result.clone(),
        });

        Ok(Part::ToolInvocation(invocation_part.with_result(result)))
    }

    #[instrument(skip(self, invocation, history), fields(tool = %name, tool_call_id = %invocation.tool_call_id))]
    async fn execute_confirmed(
        &self,
        name: ToolName,
        invocation: &ToolInvocation,
        history: &Arc<Vec<ModelMessage>>,
    ) -> Result<Value> {
        let Some(executor) = self.executors.get(&name) else {
            warn!("Approved tool has no confirmed executor");
            return Ok(Value::String(MISSING_EXECUTOR_RESULT.to_string()));
        };

        if let Err(e) = self.registry.validate_args(name, &invocation.args) {
            warn!(error = %e, "Rejecting approved call with invalid arguments");
            return Ok(Value::String(format!("Error: {}", e)));
        }

        let context = ToolContext {
            messages: Arc::clone(history),
            tool_call_id: invocation.tool_call_id.clone(),
        };

        info!("Executing confirmed tool");
        match executor.execute(invocation.args.clone(), &context).await {
            Ok(result) => {
                info!("Confirmed tool executed successfully");
                Ok(result)
            }
            Err(e) => match self.failure_policy {
                FailurePolicy::Isolate => {
                    error!(error = %e, "Confirmed tool failed");
                    Ok(Value::String(format!("Error: {}", e)))
                }
                FailurePolicy::FailFast => {
                    error!(error = %e, "Confirmed tool failed, aborting turn");
                    Err(e.context(format!("Tool '{}' failed", name)))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Message, ToolInvocationState};
    use crate::tools::approval::{APPROVAL_NO, APPROVAL_YES};
    use crate::tools::{ToolDescriptor, ToolInputSchema};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    /// Records every call; optionally fails or sleeps
    #[derive(Default)]
    struct RecordingTool {
        calls: AtomicUsize,
        seen: Mutex<Vec<ToolContext>>,
        fail: bool,
        delay_ms: u64,
    }

    #[async_trait]
    impl ToolExecutor for RecordingTool {
        async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(context.clone());
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(json!({"grievance_id": "G-1", "title": input["title"]}))
        }
    }

    struct AutoTool;

    #[async_trait]
    impl ToolExecutor for AutoTool {
        async fn execute(&self, _input: Value, _context: &ToolContext) -> Result<Value> {
            panic!("auto-executable tools are never run by the processor");
        }
    }

    fn grievance_args() -> Value {
        json!({"title": "Pension delayed"})
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new(
                    ToolName::ClassifyGrievance,
                    "classify",
                    ToolInputSchema::simple(vec![("query", "text")]),
                )
                .unwrap()
                .with_execute(Arc::new(AutoTool)),
            )
            .unwrap();
        registry
            .register(
                ToolDescriptor::new(
                    ToolName::CreateGrievance,
                    "create",
                    ToolInputSchema::simple(vec![("title", "title")]),
                )
                .unwrap(),
            )
            .unwrap();
        for name in [ToolName::DocumentUpload, ToolName::AdditionalSupport] {
            registry
                .register(ToolDescriptor::new(name, "ui", ToolInputSchema::object()).unwrap())
                .unwrap();
        }
        Arc::new(registry)
    }

    fn processor(tool: Arc<RecordingTool>) -> ToolCallProcessor {
        let mut processor = ToolCallProcessor::new(registry());
        processor
            .register_executor(ToolName::CreateGrievance, tool)
            .unwrap();
        processor
    }

    fn conversation(parts: Vec<Part>) -> Conversation {
        Conversation::new(vec![
            Message::user("My pension has not arrived for three months"),
            Message::assistant(parts),
        ])
    }

    fn invocation(id: &str, tool: &str, args: Value, result: Option<Value>) -> Part {
        let call = ToolInvocation::call(id, tool, args);
        match result {
            Some(result) => call.with_result(result).into(),
            None => call.into(),
        }
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<DataStreamPart> {
        let mut parts = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            parts.push(DataStreamPart::decode(&frame).unwrap());
        }
        parts
    }

    fn last_result(conversation: &Conversation, index: usize) -> Option<Value> {
        conversation.last().unwrap().parts.as_ref().unwrap()[index]
            .tool_invocation()
            .unwrap()
            .result
            .clone()
    }

    #[tokio::test]
    async fn test_no_tool_invocations_returns_unchanged() {
        let tool = Arc::new(RecordingTool::default());
        let processor = processor(tool.clone());
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![Part::text("How can I help?")]);
        let output = processor.process(&input, &writer).await.unwrap();

        assert_eq!(output, input);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_message_without_parts_returns_unchanged() {
        let processor = processor(Arc::new(RecordingTool::default()));
        let (writer, _rx) = DataStreamWriter::channel();

        let mut message = Message::user("hello");
        message.parts = None;
        let input = Conversation::new(vec![message]);

        assert_eq!(processor.process(&input, &writer).await.unwrap(), input);
        let empty = Conversation::default();
        assert_eq!(processor.process(&empty, &writer).await.unwrap(), empty);
    }

    #[tokio::test]
    async fn test_confirmed_runs_executor_once_and_emits_result() {
        let tool = Arc::new(RecordingTool::default());
        let processor = processor(tool.clone());
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![
            Part::text("Shall I file it?"),
            invocation("call_1", "createGrievance", grievance_args(), Some(json!(APPROVAL_YES))),
        ]);
        let output = processor.process(&input, &writer).await.unwrap();

        let expected = json!({"grievance_id": "G-1", "title": "Pension delayed"});
        assert_eq!(last_result(&output, 1), Some(expected.clone()));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![DataStreamPart::ToolResult {
                tool_call_id: "call_1".to_string(),
                result: expected,
            }]
        );

        // Executor saw the conversation and the correlating id
        let seen = tool.seen.lock().unwrap();
        assert_eq!(seen[0].tool_call_id, "call_1");
        assert_eq!(seen[0].messages[0].text(), "My pension has not arrived for three months");
    }

    #[tokio::test]
    async fn test_earlier_messages_are_shared() {
        let processor = processor(Arc::new(RecordingTool::default()));
        let (writer, _rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            grievance_args(),
            Some(json!(APPROVAL_NO)),
        )]);
        let output = processor.process(&input, &writer).await.unwrap();

        assert!(Arc::ptr_eq(&input.messages()[0], &output.messages()[0]));
        // Input still holds the approval signal
        assert_eq!(last_result(&input, 0), Some(json!(APPROVAL_NO)));
    }

    #[tokio::test]
    async fn test_denied_never_runs_executor() {
        let tool = Arc::new(RecordingTool::default());
        let processor = processor(tool.clone());
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            grievance_args(),
            Some(json!(APPROVAL_NO)),
        )]);
        let output = processor.process(&input, &writer).await.unwrap();

        assert_eq!(last_result(&output, 0), Some(json!(DENIED_RESULT)));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_non_gated_tool_unchanged_in_any_state() {
        let processor = processor(Arc::new(RecordingTool::default()));
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![
            invocation("call_1", "classifyGrievance", json!({"query": "x"}), None),
            invocation(
                "call_2",
                "classifyGrievance",
                json!({"query": "x"}),
                Some(json!(APPROVAL_YES)),
            ),
        ]);
        let output = processor.process(&input, &writer).await.unwrap();

        assert_eq!(output, input);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_ui_deferred_call_unchanged() {
        let processor = processor(Arc::new(RecordingTool::default()));
        let (writer, mut rx) = DataStreamWriter::channel();

        let raw = json!({
            "type": "tool-invocation",
            "toolInvocation": {
                "state": "call",
                "step": 2,
                "toolCallId": "call_7",
                "toolName": "documentUpload",
                "args": {"documentType": "pension slip"}
            }
        });
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        let input = conversation(vec![part]);
        let output = processor.process(&input, &writer).await.unwrap();

        let out_part = &output.last().unwrap().parts.as_ref().unwrap()[0];
        assert_eq!(serde_json::to_value(out_part).unwrap(), raw);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_ui_deferred_empty_result_uses_fallback() {
        let processor = processor(Arc::new(RecordingTool::default()));
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_3",
            "additionalSupport",
            json!({}),
            Some(json!("")),
        )]);
        let output = processor.process(&input, &writer).await.unwrap();

        let fallback = json!(ToolName::AdditionalSupport.ui_fallback().unwrap());
        assert_eq!(last_result(&output, 0), Some(fallback.clone()));
        assert_eq!(
            drain(&mut rx),
            vec![DataStreamPart::ToolResult {
                tool_call_id: "call_3".to_string(),
                result: fallback,
            }]
        );
    }

    #[tokio::test]
    async fn test_approved_without_executor_resolves_to_error_string() {
        let processor = ToolCallProcessor::new(registry());
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            grievance_args(),
            Some(json!(APPROVAL_YES)),
        )]);
        let output = processor.process(&input, &writer).await.unwrap();

        assert_eq!(last_result(&output, 0), Some(json!(MISSING_EXECUTOR_RESULT)));
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_gate_state_unchanged() {
        let tool = Arc::new(RecordingTool::default());
        let processor = processor(tool.clone());
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            grievance_args(),
            Some(json!("I'm not sure")),
        )]);
        let output = processor.process(&input, &writer).await.unwrap();

        assert_eq!(output, input);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rerun_on_resolved_message_is_noop() {
        let tool = Arc::new(RecordingTool::default());
        let processor = processor(tool.clone());
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            grievance_args(),
            Some(json!(APPROVAL_YES)),
        )]);
        let first = processor.process(&input, &writer).await.unwrap();
        let second = processor.process(&first, &writer).await.unwrap();

        assert_eq!(second, first);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_args_resolve_to_error_string() {
        let tool = Arc::new(RecordingTool::default());
        let processor = processor(tool.clone());
        let (writer, _rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            json!({"title": 12}),
            Some(json!(APPROVAL_YES)),
        )]);
        let output = processor.process(&input, &writer).await.unwrap();

        let result = last_result(&output, 0).unwrap();
        assert!(result.as_str().unwrap().starts_with("Error: Invalid arguments for createGrievance"));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_executor_failure_isolated_by_default() {
        let tool = Arc::new(RecordingTool {
            fail: true,
            ..Default::default()
        });
        let processor = processor(tool);
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            grievance_args(),
            Some(json!(APPROVAL_YES)),
        )]);
        let output = processor.process(&input, &writer).await.unwrap();

        assert_eq!(last_result(&output, 0), Some(json!("Error: backend unavailable")));
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_executor_failure_aborts_when_fail_fast() {
        let tool = Arc::new(RecordingTool {
            fail: true,
            ..Default::default()
        });
        let processor = processor(tool).with_failure_policy(FailurePolicy::FailFast);
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![invocation(
            "call_1",
            "createGrievance",
            grievance_args(),
            Some(json!(APPROVAL_YES)),
        )]);
        let err = processor.process(&input, &writer).await.unwrap_err();

        assert!(format!("{:#}", err).contains("backend unavailable"));
        assert!(drain(&mut rx).is_empty());
    }

    /// Fails at once for one title, finishes slowly for any other
    #[derive(Default)]
    struct SplitTool {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl ToolExecutor for SplitTool {
        async fn execute(&self, input: Value, _context: &ToolContext) -> Result<Value> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if input["title"] == "broken" {
                anyhow::bail!("backend unavailable");
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"grievance_id": "G-2"}))
        }
    }

    #[tokio::test]
    async fn test_fail_fast_lets_sibling_executors_finish() {
        let tool = Arc::new(SplitTool::default());
        let mut processor =
            ToolCallProcessor::new(registry()).with_failure_policy(FailurePolicy::FailFast);
        processor
            .register_executor(ToolName::CreateGrievance, tool.clone())
            .unwrap();
        let (writer, mut rx) = DataStreamWriter::channel();

        let input = conversation(vec![
            invocation(
                "call_bad",
                "createGrievance",
                json!({"title": "broken"}),
                Some(json!(APPROVAL_YES)),
            ),
            invocation(
                "call_slow",
                "createGrievance",
                grievance_args(),
                Some(json!(APPROVAL_YES)),
            ),
        ]);
        let err = processor.process(&input, &writer).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Tool 'createGrievance' failed"));
        assert_eq!(tool.started.load(Ordering::SeqCst), 2);
        assert_eq!(tool.finished.load(Ordering::SeqCst), 1);
        // The completed sibling still reports its result
        assert_eq!(
            drain(&mut rx),
            vec![DataStreamPart::ToolResult {
                tool_call_id: "call_slow".to_string(),
                result: json!({"grievance_id": "G-2"}),
            }]
        );
    }

    #[tokio::test]
    async fn test_parts_processed_concurrently_each_once() {
        let tool = Arc::new(RecordingTool {
            delay_ms: 50,
            ..Default::default()
        });
        let processor = processor(tool.clone());
        let (writer, mut rx) = DataStreamWriter::channel();

        let parts = (0..5)
            .map(|i| {
                invocation(
                    &format!("call_{}", i),
                    "createGrievance",
                    grievance_args(),
                    Some(json!(APPROVAL_YES)),
                )
            })
            .collect();
        let input = conversation(parts);

        let started = std::time::Instant::now();
        let output = processor.process(&input, &writer).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(250));

        assert_eq!(tool.calls.load(Ordering::SeqCst), 5);
        let mut ids: Vec<_> = drain(&mut rx)
            .into_iter()
            .map(|part| match part {
                DataStreamPart::ToolResult { tool_call_id, .. } => tool_call_id,
                other => panic!("unexpected frame: {:?}", other),
            })
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["call_0", "call_1", "call_2", "call_3", "call_4"]);

        // Order of parts is preserved regardless of completion order
        for (i, part) in output.last().unwrap().parts.as_ref().unwrap().iter().enumerate() {
            let invocation = part.tool_invocation().unwrap();
            assert_eq!(invocation.tool_call_id, format!("call_{}", i));
            assert_eq!(invocation.state, ToolInvocationState::Result);
        }
    }

    #[test]
    fn test_register_executor_rejects_bad_targets() {
        let mut processor = ToolCallProcessor::new(registry());
        let tool: Arc<dyn ToolExecutor> = Arc::new(RecordingTool::default());

        assert!(matches!(
            processor.register_executor(ToolName::ClassifyGrievance, tool.clone()),
            Err(ToolError::NotGated(ToolName::ClassifyGrievance))
        ));
        assert!(matches!(
            processor.register_executor(ToolName::PerformMySchemeSearch, tool.clone()),
            Err(ToolError::NotRegistered(ToolName::PerformMySchemeSearch))
        ));
        processor
            .register_executor(ToolName::CreateGrievance, tool.clone())
            .unwrap();
        assert!(matches!(
            processor.register_executor(ToolName::CreateGrievance, tool),
            Err(ToolError::DuplicateExecutor(ToolName::CreateGrievance))
        ));
    }
}
