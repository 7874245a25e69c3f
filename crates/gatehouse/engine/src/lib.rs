//! Gatehouse decision engine
//!
//! Combines the verdicts of independently registered access gates into
//! one authorization decision per request. Three components share the
//! registry's applicability filtering and ordering but fold
//! differently: the [`DecisionEngine`] combines grant/deny verdicts,
//! the [`QueryTransformer`] chains query rewrites, and the
//! [`RestrictionPredicateEvaluator`] answers the cheap "could anything
//! restrict this at all" questions. [`AccessControl`] bundles all
//! three behind the surface a resource resolver calls.

#![deny(unsafe_code)]

pub mod control;
pub mod decision;
pub mod engine;
pub mod predicates;
pub mod transform;

pub use control::AccessControl;
pub use decision::{DecisionCard, GateVerdict};
pub use engine::DecisionEngine;
pub use predicates::RestrictionPredicateEvaluator;
pub use transform::QueryTransformer;

pub use gatehouse_registry::{
    AccessGate, GateRegistration, GateRegistrationBuilder, GateRegistry, RegistrationError,
    RegistrationId,
};
pub use gatehouse_types::{
    AccessContext, DecisionRequest, GateResult, Operation, QueryTransformError,
};
