// classifyGrievance - maps grievance text to department, category and subcategory

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::grm::GrmClient;
use crate::tools::registry::{ToolDescriptor, ToolExecutor};
use crate::tools::types::{ToolContext, ToolInputSchema, ToolName};
use crate::tools::ToolError;

#[derive(Deserialize)]
struct Input {
    query: String,
}

pub struct ClassifyGrievanceTool {
    grm: Arc<GrmClient>,
}

impl ClassifyGrievanceTool {
    pub fn new(grm: Arc<GrmClient>) -> Self {
        Self { grm }
    }

    /// Auto-executable descriptor
    pub fn descriptor(grm: Arc<GrmClient>) -> Result<ToolDescriptor, ToolError> {
        Ok(ToolDescriptor::new(
            ToolName::ClassifyGrievance,
            "Classify the user's grievance to the right department, category and subcategory.",
            ToolInputSchema::simple(vec![("query", "User grievance text")]),
        )?
        .with_execute(Arc::new(Self::new(grm))))
    }
}

#[async_trait]
impl ToolExecutor for ClassifyGrievanceTool {
    async fn execute(&self, input: Value, _context: &ToolContext) -> Result<Value> {
        let input: Input = serde_json::from_value(input).context("Missing query parameter")?;
        self.grm.classify(&input.query).await
    }
}
