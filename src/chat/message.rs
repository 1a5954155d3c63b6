// Conversation messages as exchanged with the client UI
//
// Unknown fields and unknown part types are carried through untouched so a
// message the processor does not resolve goes back out exactly as it came in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: None,
            role: Role::User,
            parts: Some(vec![Part::text(text.clone())]),
            content: text,
            extra: Map::new(),
        }
    }

    pub fn assistant(parts: Vec<Part>) -> Self {
        let content = parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("");
        Self {
            id: None,
            role: Role::Assistant,
            content,
            parts: Some(parts),
            extra: Map::new(),
        }
    }

    /// Plain text of the message, preferring `content`
    pub fn text(&self) -> String {
        if !self.content.is_empty() {
            return self.content.clone();
        }
        self.parts
            .iter()
            .flatten()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool invocations embedded in this message
    pub fn tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().flatten().filter_map(Part::tool_invocation)
    }
}

/// One part of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text(TextPart),
    ToolInvocation(ToolInvocationPart),
    Other(Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(TextPart {
            kind: TextTag::Text,
            text: text.into(),
            extra: Map::new(),
        })
    }

    pub fn tool_invocation(&self) -> Option<&ToolInvocation> {
        match self {
            Part::ToolInvocation(part) => Some(&part.tool_invocation),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(part) => Some(&part.text),
            _ => None,
        }
    }

    /// Whether this is a `step-start` boundary between model steps
    pub fn is_step_start(&self) -> bool {
        matches!(self, Part::Other(value) if value.get("type").and_then(Value::as_str) == Some("step-start"))
    }
}

impl From<ToolInvocation> for Part {
    fn from(tool_invocation: ToolInvocation) -> Self {
        Part::ToolInvocation(ToolInvocationPart {
            kind: ToolInvocationTag::ToolInvocation,
            tool_invocation,
            extra: Map::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum TextTag {
    #[serde(rename = "text")]
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(rename = "type")]
    kind: TextTag,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum ToolInvocationTag {
    #[serde(rename = "tool-invocation")]
    ToolInvocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationPart {
    #[serde(rename = "type")]
    kind: ToolInvocationTag,
    #[serde(rename = "toolInvocation")]
    pub tool_invocation: ToolInvocation,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolInvocationPart {
    /// Same part with the invocation's result replaced
    pub fn with_result(&self, result: Value) -> Self {
        Self {
            tool_invocation: self.tool_invocation.with_result(result),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolInvocationState {
    Call,
    PartialCall,
    Result,
}

/// A model-requested tool call and, once available, its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub state: ToolInvocationState,
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolInvocation {
    pub fn call(tool_call_id: impl Into<String>, tool_name: impl Into<String>, args: Value) -> Self {
        Self {
            state: ToolInvocationState::Call,
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args,
            result: None,
            extra: Map::new(),
        }
    }

    /// Same invocation in `result` state carrying `result`
    pub fn with_result(&self, result: Value) -> Self {
        Self {
            state: ToolInvocationState::Result,
            result: Some(result),
            ..self.clone()
        }
    }
}
