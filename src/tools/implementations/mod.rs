// Tool implementations
//
// The grievance assistant's tool set and the wiring that builds it.

pub mod additional_support;
pub mod classify_grievance;
pub mod create_grievance;
pub mod document_upload;
pub mod scheme_search;

pub use classify_grievance::ClassifyGrievanceTool;
pub use create_grievance::CreateGrievanceTool;
pub use scheme_search::SchemeSearchTool;

use std::sync::Arc;

use crate::grm::GrmClient;
use crate::scheme::SchemeSearchClient;
use crate::tools::processor::{FailurePolicy, ToolCallProcessor};
use crate::tools::registry::ToolRegistry;
use crate::tools::types::ToolName;
use crate::tools::ToolError;

/// Register every tool.
///
/// Classification and scheme search run as soon as the model asks; grievance
/// creation and the two UI tools wait for the user.
pub fn grievance_registry(
    grm: Arc<GrmClient>,
    scheme: Arc<SchemeSearchClient>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(ClassifyGrievanceTool::descriptor(grm)?)?;
    registry.register(CreateGrievanceTool::descriptor()?)?;
    registry.register(SchemeSearchTool::descriptor(scheme)?)?;
    registry.register(document_upload::descriptor()?)?;
    registry.register(additional_support::descriptor()?)?;
    Ok(registry)
}

/// Processor over `registry` with the confirmed executors attached.
///
/// The UI tools get no executor: approving one without a UI result resolves
/// to the missing-executor error.
pub fn grievance_processor(
    registry: Arc<ToolRegistry>,
    grm: Arc<GrmClient>,
    failure_policy: FailurePolicy,
) -> Result<ToolCallProcessor, ToolError> {
    let mut processor = ToolCallProcessor::new(registry).with_failure_policy(failure_policy);
    processor.register_executor(
        ToolName::CreateGrievance,
        Arc::new(CreateGrievanceTool::new(grm)),
    )?;
    Ok(processor)
}
