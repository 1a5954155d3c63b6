// additionalSupport - hands the citizen over to a human support group

use crate::tools::registry::ToolDescriptor;
use crate::tools::types::{ToolInputSchema, ToolName};
use crate::tools::ToolError;

/// Gated, UI-deferred: the client arranges the handoff
pub fn descriptor() -> Result<ToolDescriptor, ToolError> {
    ToolDescriptor::new(
        ToolName::AdditionalSupport,
        "Offer to connect the user with a human support group when they need help beyond \
         filing a grievance.",
        ToolInputSchema::simple(vec![("reason", "Why additional support is needed")]),
    )
}
