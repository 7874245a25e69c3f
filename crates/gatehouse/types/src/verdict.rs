//! Per-gate verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The verdict a single gate returns for one decision call.
///
/// When verdicts are combined, `Granted` dominates everything,
/// `Denied` dominates `CantDecide`, and `CantDecide` contributes
/// nothing to the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateResult {
    /// The gate grants the requested operation.
    Granted,
    /// The gate denies the requested operation.
    Denied,
    /// The gate has no information either way.
    CantDecide,
}

impl GateResult {
    pub fn is_granted(&self) -> bool {
        matches!(self, GateResult::Granted)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, GateResult::Denied)
    }

    pub fn is_cant_decide(&self) -> bool {
        matches!(self, GateResult::CantDecide)
    }
}

impl fmt::Display for GateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GateResult::Granted => "granted",
            GateResult::Denied => "denied",
            GateResult::CantDecide => "cant-decide",
        })
    }
}
