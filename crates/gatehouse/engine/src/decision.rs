//! Audit artifacts produced by the decision engine.

use chrono::{DateTime, Utc};
use gatehouse_types::{AccessContext, DecisionRequest, GateResult, Operation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One gate's contribution to a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Name of the gate that produced this verdict.
    pub gate: String,
    /// The gate's registration ranking.
    pub ranking: i32,
    /// What the gate answered. Faulted gates (panic, timeout) are
    /// recorded as [`GateResult::CantDecide`].
    pub verdict: GateResult,
    /// Whether this verdict ended the fold.
    pub decisive: bool,
}

/// The full record of one evaluated decision request.
///
/// Carries the request, the final verdict, and the trail of per-gate
/// verdicts in evaluation order. Gates past a decisive verdict are
/// never consulted, so the trail can be shorter than the number of
/// matching registrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCard {
    pub id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub resource_path: String,
    pub operation: Operation,
    pub context: AccessContext,
    pub value_name: Option<String>,
    /// The combined verdict returned to the caller.
    pub verdict: GateResult,
    /// How many registrations matched the request.
    pub gates_matched: usize,
    /// Per-gate verdicts, highest ranking first.
    pub trail: Vec<GateVerdict>,
}

impl DecisionCard {
    pub(crate) fn new(
        request: &DecisionRequest,
        verdict: GateResult,
        gates_matched: usize,
        trail: Vec<GateVerdict>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            resource_path: request.resource_path.clone(),
            operation: request.operation,
            context: request.context,
            value_name: request.value_name.clone(),
            verdict,
            gates_matched,
            trail,
        }
    }

    /// How many gates were actually invoked.
    pub fn gates_consulted(&self) -> usize {
        self.trail.len()
    }

    pub fn is_granted(&self) -> bool {
        self.verdict.is_granted()
    }

    pub fn is_denied(&self) -> bool {
        self.verdict.is_denied()
    }
}
