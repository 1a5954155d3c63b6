// Data stream frames
//
// Each frame is one line: a single-character type code, a colon, a JSON
// payload, and a newline.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Frame is missing the ':' separator")]
    MissingSeparator,

    #[error("Unknown frame code '{0}'")]
    UnknownCode(String),

    #[error("Invalid frame payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    Error,
    Other,
    Unknown,
}

impl FinishReason {
    /// Map a Claude `stop_reason`
    pub fn from_stop_reason(stop_reason: Option<&str>) -> Self {
        match stop_reason {
            Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::Length,
            Some("tool_use") => FinishReason::ToolCalls,
            Some(_) => FinishReason::Other,
            None => FinishReason::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn add(self, other: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
        }
    }
}

impl From<&crate::claude::Usage> for Usage {
    fn from(usage: &crate::claude::Usage) -> Self {
        Self {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataStreamPart {
    Text(String),
    Data(Vec<Value>),
    Error(String),
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    ToolResult {
        tool_call_id: String,
        result: Value,
    },
    StartStep {
        message_id: String,
    },
    FinishStep {
        finish_reason: FinishReason,
        usage: Usage,
        is_continued: bool,
    },
    FinishMessage {
        finish_reason: FinishReason,
        usage: Usage,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolCallPayload {
    tool_call_id: String,
    tool_name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultPayload {
    tool_call_id: String,
    #[serde(default)]
    result: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartStepPayload {
    message_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishPayload {
    finish_reason: FinishReason,
    #[serde(default)]
    usage: Usage,
    #[serde(default)]
    is_continued: bool,
}

impl DataStreamPart {
    pub fn code(&self) -> &'static str {
        match self {
            DataStreamPart::Text(_) => "0",
            DataStreamPart::Data(_) => "2",
            DataStreamPart::Error(_) => "3",
            DataStreamPart::ToolCall { .. } => "9",
            DataStreamPart::ToolResult { .. } => "a",
            DataStreamPart::FinishMessage { .. } => "d",
            DataStreamPart::FinishStep { .. } => "e",
            DataStreamPart::StartStep { .. } => "f",
        }
    }

    fn payload(&self) -> Value {
        match self {
            DataStreamPart::Text(text) | DataStreamPart::Error(text) => json!(text),
            DataStreamPart::Data(values) => json!(values),
            DataStreamPart::ToolCall {
                tool_call_id,
                tool_name,
                args,
            } => json!({
                "toolCallId": tool_call_id,
                "toolName": tool_name,
                "args": args,
            }),
            DataStreamPart::ToolResult {
                tool_call_id,
                result,
            } => json!({
                "toolCallId": tool_call_id,
                "result": result,
            }),
            DataStreamPart::StartStep { message_id } => json!({ "messageId": message_id }),
            DataStreamPart::FinishStep {
                finish_reason,
                usage,
                is_continued,
            } => json!({
                "finishReason": finish_reason,
                "usage": usage,
                "isContinued": is_continued,
            }),
            DataStreamPart::FinishMessage {
                finish_reason,
                usage,
            } => json!({
                "finishReason": finish_reason,
                "usage": usage,
            }),
        }
    }

    /// Encode as one newline-terminated frame
    pub fn encode(&self) -> String {
        format!("{}:{}\n", self.code(), self.payload())
    }

    /// Decode one frame; a trailing newline is optional
    pub fn decode(line: &str) -> Result<Self, StreamError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let (code, payload) = line.split_once(':').ok_or(StreamError::MissingSeparator)?;

        let part = match code {
            "0" => DataStreamPart::Text(serde_json::from_str(payload)?),
            "2" => DataStreamPart::Data(serde_json::from_str(payload)?),
            "3" => DataStreamPart::Error(serde_json::from_str(payload)?),
            "9" => {
                let p: ToolCallPayload = serde_json::from_str(payload)?;
                DataStreamPart::ToolCall {
                    tool_call_id: p.tool_call_id,
                    tool_name: p.tool_name,
                    args: p.args,
                }
            }
            "a" => {
                let p: ToolResultPayload = serde_json::from_str(payload)?;
                DataStreamPart::ToolResult {
                    tool_call_id: p.tool_call_id,
                    result: p.result,
                }
            }
            "d" => {
                let p: FinishPayload = serde_json::from_str(payload)?;
                DataStreamPart::FinishMessage {
                    finish_reason: p.finish_reason,
                    usage: p.usage,
                }
            }
            "e" => {
                let p: FinishPayload = serde_json::from_str(payload)?;
                DataStreamPart::FinishStep {
                    finish_reason: p.finish_reason,
                    usage: p.usage,
                    is_continued: p.is_continued,
                }
            }
            "f" => {
                let p: StartStepPayload = serde_json::from_str(payload)?;
                DataStreamPart::StartStep {
                    message_id: p.message_id,
                }
            }
            other => return Err(StreamError::UnknownCode(other.to_string())),
        };

        Ok(part)
    }

    /// Decode every frame in a response body
    pub fn decode_all(body: &str) -> Result<Vec<Self>, StreamError> {
        body.lines()
            .filter(|line| !line.is_empty())
            .map(Self::decode)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_frame() {
        let part = DataStreamPart::ToolResult {
            tool_call_id: "call_1".to_string(),
            result: json!("Error: User denied access to tool execution"),
        };
        let encoded = part.encode();
        assert!(encoded.starts_with("a:{"));
        assert!(encoded.ends_with("}\n"));
        assert!(encoded.contains("\"toolCallId\":\"call_1\""));
        assert!(encoded.contains("\"result\":\"Error: User denied access to tool execution\""));
        assert_eq!(DataStreamPart::decode(&encoded).unwrap(), part);
    }

    #[test]
    fn test_text_frame_escapes_newlines() {
        let part = DataStreamPart::Text("line one\nline two".to_string());
        let encoded = part.encode();
        assert_eq!(encoded, "0:\"line one\\nline two\"\n");
        assert_eq!(encoded.matches('\n').count(), 1);
    }

    #[test]
    fn test_finish_step_frame() {
        let part = DataStreamPart::FinishStep {
            finish_reason: FinishReason::ToolCalls,
            usage: Usage {
                prompt_tokens: 12,
                completion_tokens: 4,
            },
            is_continued: false,
        };
        let encoded = part.encode();
        assert!(encoded.starts_with("e:"));
        assert!(encoded.contains("\"finishReason\":\"tool-calls\""));
        assert_eq!(DataStreamPart::decode(&encoded).unwrap(), part);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            DataStreamPart::decode("no separator"),
            Err(StreamError::MissingSeparator)
        ));
        assert!(matches!(
            DataStreamPart::decode("z:{}"),
            Err(StreamError::UnknownCode(code)) if code == "z"
        ));
        assert!(matches!(
            DataStreamPart::decode("a:{not json"),
            Err(StreamError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_decode_all() {
        let body = "f:{\"messageId\":\"msg-1\"}\n0:\"Hello\"\nd:{\"finishReason\":\"stop\"}\n";
        let parts = DataStreamPart::decode_all(body).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], DataStreamPart::Text("Hello".to_string()));
        assert!(matches!(
            parts[2],
            DataStreamPart::FinishMessage {
                finish_reason: FinishReason::Stop,
                ..
            }
        ));
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_stop_reason(Some("tool_use")), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from_stop_reason(Some("end_turn")), FinishReason::Stop);
        assert_eq!(FinishReason::from_stop_reason(None), FinishReason::Unknown);
    }
}
