// createGrievance - files a grievance, only after the user confirms

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::grm::{GrmClient, NewGrievance};
use crate::tools::registry::{ToolDescriptor, ToolExecutor};
use crate::tools::types::{ToolContext, ToolInputSchema, ToolName};
use crate::tools::ToolError;

const DESCRIPTION: &str = "Create a new grievance in the system. IMPORTANT: DO NOT call this \
function until you have collected ALL mandatory information from the user. The description \
field MUST include all personal details and category-specific required information in a \
structured format.";

/// Confirmed executor for `createGrievance`
pub struct CreateGrievanceTool {
    grm: Arc<GrmClient>,
}

impl CreateGrievanceTool {
    pub fn new(grm: Arc<GrmClient>) -> Self {
        Self { grm }
    }

    /// Gated descriptor: no execute capability, so every call waits for the user
    pub fn descriptor() -> Result<ToolDescriptor, ToolError> {
        ToolDescriptor::new(ToolName::CreateGrievance, DESCRIPTION, input_schema())
    }
}

fn input_schema() -> ToolInputSchema {
    ToolInputSchema::object()
        .string("title", "A short, clear title summarizing the grievance issue")
        .string(
            "description",
            "MUST include ALL of the following in a structured format: 1) Personal details \
             (full name, contact info, complete address with PIN code), 2) Detailed description \
             of the issue with dates and specifics, 3) Category-specific required information, \
             4) Timeline of incidents and previous follow-ups, 5) Expected resolution.",
        )
        .string(
            "category",
            "Main category of the grievance. If unsure or not a grievance, use 'Other' or 'None'",
        )
        .string(
            "cpgrams_category",
            "Full category name along with subcategories from the CPGRAMS classification",
        )
        .string_enum(
            "priority",
            "Priority level based on the urgency and impact of the grievance",
            &["low", "medium", "high"],
        )
}

#[async_trait]
impl ToolExecutor for CreateGrievanceTool {
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<Value> {
        let grievance: NewGrievance =
            serde_json::from_value(input).context("Invalid grievance fields")?;

        tracing::info!(tool_call_id = %context.tool_call_id, "Filing confirmed grievance");
        self.grm.create_grievance(&grievance).await
    }
}
