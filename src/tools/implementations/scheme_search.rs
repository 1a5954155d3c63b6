// performMySchemeSearch - looks up government schemes before a grievance is filed

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::scheme::SchemeSearchClient;
use crate::tools::registry::{ToolDescriptor, ToolExecutor};
use crate::tools::types::{ToolContext, ToolInputSchema, ToolName};
use crate::tools::ToolError;

pub struct SchemeSearchTool {
    client: Arc<SchemeSearchClient>,
}

impl SchemeSearchTool {
    pub fn new(client: Arc<SchemeSearchClient>) -> Self {
        Self { client }
    }

    /// Auto-executable descriptor
    pub fn descriptor(client: Arc<SchemeSearchClient>) -> Result<ToolDescriptor, ToolError> {
        Ok(ToolDescriptor::new(
            ToolName::PerformMySchemeSearch,
            "Search *.myscheme.gov.in for any scheme-related grievance, in case it can be \
             resolved immediately using information on the myscheme website.",
            ToolInputSchema::simple(vec![(
                "query",
                "Search query. Based solely on the user query, optimized for search, with no \
                 information the user did not provide.",
            )]),
        )?
        .with_execute(Arc::new(Self::new(client))))
    }
}

#[async_trait]
impl ToolExecutor for SchemeSearchTool {
    /// Never fails: search problems are reported in the result for the model
    async fn execute(&self, input: Value, _context: &ToolContext) -> Result<Value> {
        let Some(query) = input["query"].as_str() else {
            return Ok(json!({"success": false, "error": "Missing query parameter"}));
        };

        match self.client.search(query).await {
            Ok(results) => Ok(results),
            Err(e) => {
                tracing::error!(error = %e, "Error performing MyScheme search");
                Ok(json!({"success": false, "error": e.to_string()}))
            }
        }
    }
}
