//! The resolver-facing surface.

use crate::decision::DecisionCard;
use crate::engine::DecisionEngine;
use crate::predicates::RestrictionPredicateEvaluator;
use crate::transform::QueryTransformer;
use gatehouse_registry::GateRegistry;
use gatehouse_types::{
    AccessContext, DecisionRequest, GateResult, Operation, QueryTransformError,
};
use std::sync::Arc;
use std::time::Duration;

/// Everything a resource resolver asks of the gate subsystem, bound to
/// one context and one shared registry.
///
/// One instance is built per context: [`AccessControl::application`]
/// for gates covering the whole resource tree,
/// [`AccessControl::provider`] for gates covering only providers that
/// opt into access checks. The three components underneath share the
/// registry's applicability filtering and ordering but fold
/// differently.
pub struct AccessControl {
    engine: DecisionEngine,
    transformer: QueryTransformer,
    predicates: RestrictionPredicateEvaluator,
    context: AccessContext,
}

impl AccessControl {
    /// Create the surface for one context.
    pub fn new(registry: Arc<GateRegistry>, context: AccessContext) -> Self {
        Self {
            engine: DecisionEngine::new(registry.clone(), context),
            transformer: QueryTransformer::new(registry.clone(), context),
            predicates: RestrictionPredicateEvaluator::new(registry, context),
            context,
        }
    }

    /// The surface for gates applied to the whole resource tree.
    pub fn application(registry: Arc<GateRegistry>) -> Self {
        Self::new(registry, AccessContext::Application)
    }

    /// The surface for gates applied only to opted-in providers.
    pub fn provider(registry: Arc<GateRegistry>) -> Self {
        Self::new(registry, AccessContext::Provider)
    }

    /// Bound each gate decision call to `gate_timeout`.
    pub fn with_gate_timeout(mut self, gate_timeout: Duration) -> Self {
        self.engine = self.engine.with_gate_timeout(gate_timeout);
        self
    }

    /// Enable or disable per-decision audit logging.
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.engine = self.engine.with_audit(audit);
        self
    }

    /// The context this surface serves.
    pub fn context(&self) -> AccessContext {
        self.context
    }

    /// Combined verdict for an arbitrary request.
    pub async fn evaluate(&self, request: &DecisionRequest) -> GateResult {
        self.engine.evaluate(request).await
    }

    /// Combined verdict plus the per-gate audit trail.
    pub async fn evaluate_with_card(&self, request: &DecisionRequest) -> DecisionCard {
        self.engine.evaluate_with_card(request).await
    }

    pub async fn can_read(&self, resource_path: &str) -> GateResult {
        self.engine.can_read(resource_path).await
    }

    pub async fn can_create(&self, resource_path: &str) -> GateResult {
        self.engine.can_create(resource_path).await
    }

    pub async fn can_update(&self, resource_path: &str) -> GateResult {
        self.engine.can_update(resource_path).await
    }

    pub async fn can_delete(&self, resource_path: &str) -> GateResult {
        self.engine.can_delete(resource_path).await
    }

    pub async fn can_execute(&self, resource_path: &str) -> GateResult {
        self.engine.can_execute(resource_path).await
    }

    pub async fn can_order_children(&self, resource_path: &str) -> GateResult {
        self.engine.can_order_children(resource_path).await
    }

    pub async fn can_read_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.engine.can_read_value(resource_path, value_name).await
    }

    pub async fn can_create_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.engine
            .can_create_value(resource_path, value_name)
            .await
    }

    pub async fn can_update_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.engine
            .can_update_value(resource_path, value_name)
            .await
    }

    pub async fn can_delete_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.engine
            .can_delete_value(resource_path, value_name)
            .await
    }

    /// Thread a query through every gate of this context.
    pub async fn transform_query(
        &self,
        query: &str,
        language: &str,
    ) -> Result<String, QueryTransformError> {
        self.transformer.transform(query, language).await
    }

    pub async fn has_read_restrictions(&self) -> bool {
        self.predicates.has_read_restrictions().await
    }

    pub async fn has_create_restrictions(&self) -> bool {
        self.predicates.has_create_restrictions().await
    }

    pub async fn has_update_restrictions(&self) -> bool {
        self.predicates.has_update_restrictions().await
    }

    pub async fn has_delete_restrictions(&self) -> bool {
        self.predicates.has_delete_restrictions().await
    }

    pub async fn has_execute_restrictions(&self) -> bool {
        self.predicates.has_execute_restrictions().await
    }

    pub async fn has_order_children_restrictions(&self) -> bool {
        self.predicates.has_order_children_restrictions().await
    }

    pub async fn can_read_all_values(&self, resource_path: &str) -> bool {
        self.predicates.can_read_all_values(resource_path).await
    }

    pub async fn can_create_all_values(&self, resource_path: &str) -> bool {
        self.predicates.can_create_all_values(resource_path).await
    }

    pub async fn can_update_all_values(&self, resource_path: &str) -> bool {
        self.predicates.can_update_all_values(resource_path).await
    }

    pub async fn can_delete_all_values(&self, resource_path: &str) -> bool {
        self.predicates.can_delete_all_values(resource_path).await
    }

    /// Whether any restriction predicate holds for `operation`.
    pub async fn has_restrictions(&self, operation: Operation) -> bool {
        match operation {
            Operation::Read => self.has_read_restrictions().await,
            Operation::Create => self.has_create_restrictions().await,
            Operation::Update => self.has_update_restrictions().await,
            Operation::Delete => self.has_delete_restrictions().await,
            Operation::Execute => self.has_execute_restrictions().await,
            Operation::OrderChildren => self.has_order_children_restrictions().await,
        }
    }
}
