// documentUpload - the UI asks the user for a supporting document

use crate::tools::registry::ToolDescriptor;
use crate::tools::types::{ToolInputSchema, ToolName};
use crate::tools::ToolError;

/// Gated, UI-deferred: the client performs the upload and reports the result
pub fn descriptor() -> Result<ToolDescriptor, ToolError> {
    ToolDescriptor::new(
        ToolName::DocumentUpload,
        "Ask the user to upload a supporting document for their grievance. The upload is \
         handled by the user interface.",
        ToolInputSchema::object()
            .string("documentType", "Kind of document needed, e.g. pension slip or ID proof")
            .string("reason", "Why the document helps resolve the grievance"),
    )
}
