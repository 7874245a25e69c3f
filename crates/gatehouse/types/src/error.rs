//! Shared error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A gate could not safely rewrite a query.
///
/// This error is fatal to the whole transform chain: the caller must
/// not run a partially transformed query. It carries the name of the
/// gate that raised it so the failure can be attributed.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("query transformation failed in gate '{gate}': {reason}")]
pub struct QueryTransformError {
    pub gate: String,
    pub reason: String,
}

impl QueryTransformError {
    pub fn new(gate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            reason: reason.into(),
        }
    }
}
