//! Decision requests.

use crate::{AccessContext, Operation};
use serde::{Deserialize, Serialize};

/// One authorization question: may `operation` be performed on the
/// resource at `resource_path`, in `context`?
///
/// When `value_name` is set the question is about a single named value
/// of the resource rather than the resource as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub resource_path: String,
    pub operation: Operation,
    pub context: AccessContext,
    pub value_name: Option<String>,
}

impl DecisionRequest {
    /// A whole-resource request.
    pub fn new(
        resource_path: impl Into<String>,
        operation: Operation,
        context: AccessContext,
    ) -> Self {
        Self {
            resource_path: resource_path.into(),
            operation,
            context,
            value_name: None,
        }
    }

    /// A request scoped to one named value of the resource.
    pub fn for_value(
        resource_path: impl Into<String>,
        operation: Operation,
        context: AccessContext,
        value_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_path: resource_path.into(),
            operation,
            context,
            value_name: Some(value_name.into()),
        }
    }
}
