// Core types for the tool layer
//
// Tool definitions are sent to the model in Claude API tool format.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::claude::Message as ModelMessage;
use crate::tools::ToolError;

/// Every tool this deployment knows about.
///
/// Names on the wire are the camelCase identifiers the model and the client UI
/// use; anything else is rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolName {
    #[serde(rename = "classifyGrievance")]
    ClassifyGrievance,
    #[serde(rename = "createGrievance")]
    CreateGrievance,
    #[serde(rename = "performMySchemeSearch")]
    PerformMySchemeSearch,
    #[serde(rename = "documentUpload")]
    DocumentUpload,
    #[serde(rename = "additionalSupport")]
    AdditionalSupport,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::ClassifyGrievance,
        ToolName::CreateGrievance,
        ToolName::PerformMySchemeSearch,
        ToolName::DocumentUpload,
        ToolName::AdditionalSupport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ClassifyGrievance => "classifyGrievance",
            ToolName::CreateGrievance => "createGrievance",
            ToolName::PerformMySchemeSearch => "performMySchemeSearch",
            ToolName::DocumentUpload => "documentUpload",
            ToolName::AdditionalSupport => "additionalSupport",
        }
    }

    /// Tools whose result is produced by the client UI rather than by the backend
    pub fn is_ui_deferred(self) -> bool {
        matches!(self, ToolName::DocumentUpload | ToolName::AdditionalSupport)
    }

    /// Result used when the UI resolves a deferred tool without a value
    pub fn ui_fallback(self) -> Option<&'static str> {
        match self {
            ToolName::AdditionalSupport => {
                Some("A representative from a support group may reach out to you.")
            }
            _ => None,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Context passed to executors
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Full conversation in model-consumable form
    pub messages: Arc<Vec<ModelMessage>>,

    /// Correlates the execution with its invocation and result event
    pub tool_call_id: String,
}

/// Tool definition (Claude API-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// JSON Schema for tool input parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // Usually "object"
    pub properties: Value,
    pub required: Vec<String>,
}

impl ToolInputSchema {
    /// Create a simple schema with required string parameters
    pub fn simple(params: Vec<(&str, &str)>) -> Self {
        params
            .into_iter()
            .fold(Self::object(), |schema, (name, desc)| schema.string(name, desc))
    }

    /// Empty object schema
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Value::Object(serde_json::Map::new()),
            required: Vec::new(),
        }
    }

    /// Add a required string property
    pub fn string(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            serde_json::json!({
                "type": "string",
                "description": description
            }),
        )
    }

    /// Add a required string property restricted to `values`
    pub fn string_enum(self, name: &str, description: &str, values: &[&str]) -> Self {
        self.property(
            name,
            serde_json::json!({
                "type": "string",
                "enum": values,
                "description": description
            }),
        )
    }

    fn property(mut self, name: &str, spec: Value) -> Self {
        if let Value::Object(properties) = &mut self.properties {
            properties.insert(name.to_string(), spec);
        }
        self.required.push(name.to_string());
        self
    }

    /// Schema as a JSON value, for validation
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "type": self.schema_type,
            "properties": self.properties,
            "required": self.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name_round_trips_wire_names() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
            let json = serde_json::to_value(name).unwrap();
            assert_eq!(json, Value::String(name.as_str().to_string()));
        }
    }

    #[test]
    fn test_unknown_tool_name_rejected() {
        let err = "deleteEverything".parse::<ToolName>().unwrap_err();
        assert!(err.to_string().contains("deleteEverything"));
    }

    #[test]
    fn test_ui_deferred_tools() {
        assert!(ToolName::DocumentUpload.is_ui_deferred());
        assert!(ToolName::AdditionalSupport.is_ui_deferred());
        assert!(!ToolName::CreateGrievance.is_ui_deferred());
        assert!(ToolName::AdditionalSupport.ui_fallback().is_some());
        assert!(ToolName::DocumentUpload.ui_fallback().is_none());
    }

    #[test]
    fn test_simple_input_schema() {
        let schema = ToolInputSchema::simple(vec![
            ("title", "Short title"),
            ("description", "Full description"),
        ]);

        assert_eq!(schema.schema_type, "object");
        assert_eq!(schema.required, vec!["title", "description"]);
        assert_eq!(schema.properties["title"]["type"], "string");
    }

    #[test]
    fn test_enum_property() {
        let schema =
            ToolInputSchema::object().string_enum("priority", "Urgency", &["low", "medium", "high"]);
        assert_eq!(schema.properties["priority"]["enum"][2], "high");
        assert_eq!(schema.to_value()["required"][0], "priority");
    }
}
