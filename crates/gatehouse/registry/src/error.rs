//! Registration-time errors.
//!
//! These are non-fatal by design: a malformed registration is logged
//! and excluded from the registry, it never aborts the registrar or
//! poisons existing registrations.

use thiserror::Error;

/// A gate registration could not be accepted.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The required `access.context` option was not supplied.
    #[error("registration is missing the required 'access.context' option")]
    MissingContext,

    /// The supplied context is not `application` or `provider`.
    #[error("invalid access context '{value}', expected 'application' or 'provider'")]
    InvalidContext { value: String },

    /// The path pattern did not compile.
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPathPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An operation name is not one of the six canonical strings.
    #[error("unknown operation name '{name}'")]
    UnknownOperation { name: String },

    /// The ranking option is not an integer.
    #[error("invalid ranking '{value}': not an integer")]
    InvalidRanking { value: String },
}
