//! Gate application contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a gate applies to the whole resource tree or only to
/// providers that opt into access checks.
///
/// A registration without a valid context is invalid and never enters
/// the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessContext {
    /// The gate is applied to every resource in the tree.
    Application,
    /// The gate is applied only to providers requesting access checks.
    Provider,
}

impl AccessContext {
    /// Canonical wire string for this context.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessContext::Application => "application",
            AccessContext::Provider => "provider",
        }
    }

    /// Look up a context by its canonical string form.
    pub fn parse(name: &str) -> Option<AccessContext> {
        match name {
            "application" => Some(AccessContext::Application),
            "provider" => Some(AccessContext::Provider),
            _ => None,
        }
    }
}

impl fmt::Display for AccessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
