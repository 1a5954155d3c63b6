// Approval vocabulary shared verbatim with the client UI

use serde_json::Value;

/// Result value the UI writes when the user confirms a gated tool
pub const APPROVAL_YES: &str = "Yes, confirmed.";

/// Result value the UI writes when the user denies a gated tool
pub const APPROVAL_NO: &str = "No, denied.";

/// Final result of a denied invocation
pub const DENIED_RESULT: &str = "Error: User denied access to tool execution";

/// Final result of an approved invocation with nothing registered to run it
pub const MISSING_EXECUTOR_RESULT: &str = "Error: No execute function found on tool";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalSignal {
    Confirmed,
    Denied,
}

impl ApprovalSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalSignal::Confirmed => APPROVAL_YES,
            ApprovalSignal::Denied => APPROVAL_NO,
        }
    }

    /// Read a signal out of an invocation's result; only exact sentinels count
    pub fn from_result(result: &Value) -> Option<Self> {
        match result.as_str()? {
            APPROVAL_YES => Some(ApprovalSignal::Confirmed),
            APPROVAL_NO => Some(ApprovalSignal::Denied),
            _ => None,
        }
    }
}

impl From<ApprovalSignal> for Value {
    fn from(signal: ApprovalSignal) -> Self {
        Value::String(signal.as_str().to_string())
    }
}
