// Confirmation policy
//
// Decides, per tool invocation, whether the processor has anything to do.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::chat::{ToolInvocation, ToolInvocationState};
use crate::tools::approval::ApprovalSignal;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::ToolName;

/// What the processor should do with one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Leave the part exactly as it is
    PassThrough,
    /// User confirmed: run the confirmed executor for this tool
    Execute(ToolName),
    /// User declined: resolve to the denial message
    Deny,
    /// The UI produced this tool's result: accept it as final
    AcceptUiResult(Value),
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmationPolicy {
    gated: BTreeSet<ToolName>,
}

impl ConfirmationPolicy {
    pub fn new(gated: BTreeSet<ToolName>) -> Self {
        Self { gated }
    }

    pub fn from_registry(registry: &ToolRegistry) -> Self {
        Self::new(registry.tools_requiring_confirmation())
    }

    pub fn requires_confirmation(&self, name: ToolName) -> bool {
        self.gated.contains(&name)
    }

    pub fn gated(&self) -> &BTreeSet<ToolName> {
        &self.gated
    }

    pub fn decide(&self, invocation: &ToolInvocation) -> Decision {
        let Ok(name) = invocation.tool_name.parse::<ToolName>() else {
            return Decision::PassThrough;
        };

        // The UI performs these; nothing to do until it reports back
        if name.is_ui_deferred() && invocation.state == ToolInvocationState::Call {
            return Decision::PassThrough;
        }

        if !self.requires_confirmation(name) || invocation.state != ToolInvocationState::Result {
            return Decision::PassThrough;
        }

        let result = invocation.result.as_ref();
        match result.and_then(ApprovalSignal::from_result) {
            Some(ApprovalSignal::Confirmed) => Decision::Execute(name),
            Some(ApprovalSignal::Denied) => Decision::Deny,
            None if name.is_ui_deferred() => Decision::AcceptUiResult(ui_result(name, result)),
            None => Decision::PassThrough,
        }
    }
}

fn ui_result(name: ToolName, result: Option<&Value>) -> Value {
    let empty = match result {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };

    match (empty, name.ui_fallback(), result) {
        (true, Some(fallback), _) => Value::String(fallback.to_string()),
        (_, _, Some(value)) => value.clone(),
        (_, _, None) => Value::Null,
    }
}
