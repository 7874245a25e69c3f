//! Gatehouse core types
//!
//! The closed enumerations and request/error types shared by the
//! registry and the decision engine. These are pure data: no gate is
//! ever invoked from this crate.

#![deny(unsafe_code)]

mod context;
mod error;
mod operation;
mod request;
mod verdict;

pub use context::AccessContext;
pub use error::QueryTransformError;
pub use operation::Operation;
pub use request::DecisionRequest;
pub use verdict::GateResult;
