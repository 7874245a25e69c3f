//! Immutable registration metadata for one gate instance.

use crate::error::RegistrationError;
use crate::gate::AccessGate;
use chrono::{DateTime, Utc};
use gatehouse_types::{AccessContext, Operation};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Registration option: the context a gate applies in. Required.
pub const CONTEXT_OPTION: &str = "access.context";

/// Registration option: regex scoping the gate to matching resource
/// paths. Defaults to every path.
pub const PATH_OPTION: &str = "path";

/// Registration option: comma-separated operation names the gate
/// applies to. Defaults to all operations.
pub const OPERATIONS_OPTION: &str = "operations";

/// Registration option: comma-separated operation names for which this
/// gate's denial is final. Defaults to none.
pub const FINAL_OPERATIONS_OPTION: &str = "finaloperations";

/// Registration option: integer evaluation priority, higher first.
/// Defaults to 0.
pub const RANKING_OPTION: &str = "ranking";

/// The pattern a registration falls back to when none is given.
const MATCH_EVERYTHING: &str = ".*";

/// Metadata bundle tying one [`AccessGate`] to its applicability
/// scope.
///
/// Immutable once registered: changing any field means withdrawing the
/// registration and registering a new one. A single registration is
/// shared across concurrent evaluations, so all of its tests are pure
/// reads.
#[derive(Clone)]
pub struct GateRegistration {
    gate: Arc<dyn AccessGate>,
    pattern: String,
    path_pattern: Regex,
    operations: HashSet<Operation>,
    final_operations: HashSet<Operation>,
    context: AccessContext,
    ranking: i32,
    seq: u64,
    registered_at: DateTime<Utc>,
}

impl GateRegistration {
    /// Start building a registration for `gate`.
    pub fn builder(gate: Arc<dyn AccessGate>) -> GateRegistrationBuilder {
        GateRegistrationBuilder::new(gate)
    }

    /// Build a registration from string-keyed options as supplied by
    /// an external registrar.
    ///
    /// Recognized keys are [`CONTEXT_OPTION`] (required),
    /// [`PATH_OPTION`], [`OPERATIONS_OPTION`],
    /// [`FINAL_OPERATIONS_OPTION`] and [`RANKING_OPTION`]; unknown
    /// keys are ignored.
    pub fn from_options(
        gate: Arc<dyn AccessGate>,
        options: &HashMap<String, String>,
    ) -> Result<GateRegistration, RegistrationError> {
        let mut builder = GateRegistrationBuilder::new(gate);

        let context = options
            .get(CONTEXT_OPTION)
            .ok_or(RegistrationError::MissingContext)?;
        let context = AccessContext::parse(context).ok_or_else(|| {
            RegistrationError::InvalidContext {
                value: context.clone(),
            }
        })?;
        builder = builder.context(context);

        if let Some(pattern) = options.get(PATH_OPTION) {
            builder = builder.path_pattern(pattern);
        }
        if let Some(names) = options.get(OPERATIONS_OPTION) {
            builder = builder.operations(parse_operation_list(names)?);
        }
        if let Some(names) = options.get(FINAL_OPERATIONS_OPTION) {
            builder = builder.final_operations(parse_operation_list(names)?);
        }
        if let Some(ranking) = options.get(RANKING_OPTION) {
            let ranking =
                ranking
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| RegistrationError::InvalidRanking {
                        value: ranking.clone(),
                    })?;
            builder = builder.ranking(ranking);
        }

        builder.build()
    }

    /// Whether this registration's pattern matches the whole of
    /// `resource_path`.
    pub fn matches_path(&self, resource_path: &str) -> bool {
        self.path_pattern.is_match(resource_path)
    }

    /// Whether this registration declares applicability to
    /// `operation`.
    pub fn applies_to(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Whether this gate's denial of `operation` ends the fold.
    pub fn is_final_for(&self, operation: Operation) -> bool {
        self.final_operations.contains(&operation)
    }

    /// The gate this registration wraps.
    pub fn gate(&self) -> &dyn AccessGate {
        self.gate.as_ref()
    }

    /// The gate's name, for logs and audit trails.
    pub fn gate_name(&self) -> &str {
        self.gate.name()
    }

    /// The context this gate applies in.
    pub fn context(&self) -> AccessContext {
        self.context
    }

    /// Evaluation priority; higher rankings are consulted first.
    pub fn ranking(&self) -> i32 {
        self.ranking
    }

    /// Registry-assigned insertion counter, breaking ranking ties.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// When this registration entered the registry.
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// The uncompiled pattern string, as registered.
    pub fn path_pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn assigned(mut self, seq: u64) -> Self {
        self.seq = seq;
        self.registered_at = Utc::now();
        self
    }
}

impl fmt::Debug for GateRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateRegistration")
            .field("gate", &self.gate.name())
            .field("pattern", &self.pattern)
            .field("operations", &self.operations)
            .field("final_operations", &self.final_operations)
            .field("context", &self.context)
            .field("ranking", &self.ranking)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Builder for [`GateRegistration`].
///
/// Only the context is required. `final_operations` is expected to be
/// a subset of `operations`; a final operation outside the applicable
/// set is accepted but simply never reached, since the operation
/// filter runs first.
pub struct GateRegistrationBuilder {
    gate: Arc<dyn AccessGate>,
    pattern: Option<String>,
    operations: Option<HashSet<Operation>>,
    final_operations: HashSet<Operation>,
    context: Option<AccessContext>,
    ranking: i32,
}

impl GateRegistrationBuilder {
    fn new(gate: Arc<dyn AccessGate>) -> Self {
        Self {
            gate,
            pattern: None,
            operations: None,
            final_operations: HashSet::new(),
            context: None,
            ranking: 0,
        }
    }

    /// Scope the gate to resource paths fully matching `pattern`.
    pub fn path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Restrict the gate to the given operations.
    pub fn operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = Some(operations.into_iter().collect());
        self
    }

    /// Mark operations for which this gate's denial is final.
    pub fn final_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.final_operations = operations.into_iter().collect();
        self
    }

    /// Set the required context.
    pub fn context(mut self, context: AccessContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the evaluation priority; higher rankings run first.
    pub fn ranking(mut self, ranking: i32) -> Self {
        self.ranking = ranking;
        self
    }

    /// Validate the metadata and produce the immutable registration.
    pub fn build(self) -> Result<GateRegistration, RegistrationError> {
        let context = self.context.ok_or(RegistrationError::MissingContext)?;
        let pattern = self.pattern.unwrap_or_else(|| MATCH_EVERYTHING.to_owned());
        // Anchor so the pattern must cover the whole path, not a
        // substring of it.
        let path_pattern = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            RegistrationError::InvalidPathPattern {
                pattern: pattern.clone(),
                source,
            }
        })?;

        Ok(GateRegistration {
            gate: self.gate,
            pattern,
            path_pattern,
            operations: self
                .operations
                .unwrap_or_else(|| Operation::ALL.into_iter().collect()),
            final_operations: self.final_operations,
            context,
            ranking: self.ranking,
            seq: 0,
            registered_at: Utc::now(),
        })
    }
}

fn parse_operation_list(names: &str) -> Result<HashSet<Operation>, RegistrationError> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            Operation::parse(name).ok_or_else(|| RegistrationError::UnknownOperation {
                name: name.to_owned(),
            })
        })
        .collect()
}
