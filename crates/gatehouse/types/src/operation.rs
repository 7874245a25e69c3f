//! Operations on a hierarchical resource tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An operation a caller may request on a resource.
///
/// The set is closed and process-wide constant. Each operation has a
/// canonical lowercase string form used for registration matching and
/// logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    Execute,
    OrderChildren,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Operation; 6] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::Execute,
        Operation::OrderChildren,
    ];

    /// Canonical wire string for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Execute => "execute",
            Operation::OrderChildren => "order-children",
        }
    }

    /// Look up an operation by its canonical string form.
    ///
    /// Returns `None` for anything that is not one of the six wire
    /// strings; callers decide whether that is an error.
    pub fn parse(name: &str) -> Option<Operation> {
        Operation::ALL.iter().copied().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
