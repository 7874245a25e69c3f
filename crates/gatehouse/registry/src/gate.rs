//! The pluggable access gate contract.

use async_trait::async_trait;
use gatehouse_types::{GateResult, QueryTransformError};

/// A pluggable access checker for one scope of resources.
///
/// Implementations are registered with the [`GateRegistry`] together
/// with the metadata that scopes them (path pattern, operations,
/// context, ranking); the decision engine then folds their verdicts
/// into a single decision per request.
///
/// Every decision method defaults to [`GateResult::CantDecide`] and
/// every restriction predicate defaults to the conservative answer, so
/// a partial implementation can never grant access by omission. Gates
/// may block on I/O; the engine bounds each call with a timeout.
///
/// [`GateRegistry`]: crate::GateRegistry
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// Name identifying this gate in logs and audit trails.
    fn name(&self) -> &str;

    /// Whether the resource at `resource_path` may be read.
    async fn can_read(&self, _resource_path: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether a resource may be created at `resource_path`.
    async fn can_create(&self, _resource_path: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the resource at `resource_path` may be updated.
    async fn can_update(&self, _resource_path: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the resource at `resource_path` may be deleted.
    async fn can_delete(&self, _resource_path: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the resource at `resource_path` may be executed.
    async fn can_execute(&self, _resource_path: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the children of the resource at `resource_path` may be
    /// reordered.
    async fn can_order_children(&self, _resource_path: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the named value of the resource may be read.
    async fn can_read_value(&self, _resource_path: &str, _value_name: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the named value may be created on the resource.
    async fn can_create_value(&self, _resource_path: &str, _value_name: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the named value of the resource may be updated.
    async fn can_update_value(&self, _resource_path: &str, _value_name: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Whether the named value of the resource may be deleted.
    async fn can_delete_value(&self, _resource_path: &str, _value_name: &str) -> GateResult {
        GateResult::CantDecide
    }

    /// Rewrite a query to pre-narrow its result set for this gate's
    /// restrictions.
    ///
    /// The chain is advisory: every result is still checked on read,
    /// so a transform must never widen access, only narrow results.
    /// Returning an error aborts the whole chain.
    async fn transform_query(
        &self,
        query: &str,
        _language: &str,
    ) -> Result<String, QueryTransformError> {
        Ok(query.to_owned())
    }

    /// Whether this gate restricts read operations at all. Defaults to
    /// `true`: an unimplemented predicate counts as restricting.
    fn has_read_restrictions(&self) -> bool {
        true
    }

    /// Whether this gate restricts create operations at all.
    fn has_create_restrictions(&self) -> bool {
        true
    }

    /// Whether this gate restricts update operations at all.
    fn has_update_restrictions(&self) -> bool {
        true
    }

    /// Whether this gate restricts delete operations at all.
    fn has_delete_restrictions(&self) -> bool {
        true
    }

    /// Whether this gate restricts execute operations at all.
    fn has_execute_restrictions(&self) -> bool {
        true
    }

    /// Whether this gate restricts child reordering at all.
    fn has_order_children_restrictions(&self) -> bool {
        true
    }

    /// Whether every value of the resource may be read. Defaults to
    /// `false`: callers must fall back to per-value checks.
    fn can_read_all_values(&self, _resource_path: &str) -> bool {
        false
    }

    /// Whether every value may be created on the resource.
    fn can_create_all_values(&self, _resource_path: &str) -> bool {
        false
    }

    /// Whether every value of the resource may be updated.
    fn can_update_all_values(&self, _resource_path: &str) -> bool {
        false
    }

    /// Whether every value of the resource may be deleted.
    fn can_delete_all_values(&self, _resource_path: &str) -> bool {
        false
    }
}
