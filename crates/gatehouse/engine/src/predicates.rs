//! Fast restriction pre-checks.

use gatehouse_registry::{AccessGate, GateRegistry};
use gatehouse_types::{AccessContext, Operation};
use std::sync::Arc;

/// Answers the cheap "could anything restrict this at all" questions.
///
/// These predicates only look at registration metadata and the gates'
/// constant-time restriction hints; no decision method is ever
/// invoked. Callers use them to skip the full evaluation path when no
/// registered gate could possibly restrict an operation.
pub struct RestrictionPredicateEvaluator {
    registry: Arc<GateRegistry>,
    context: AccessContext,
}

impl RestrictionPredicateEvaluator {
    /// Create an evaluator bound to one context.
    pub fn new(registry: Arc<GateRegistry>, context: AccessContext) -> Self {
        Self { registry, context }
    }

    /// The context this evaluator serves.
    pub fn context(&self) -> AccessContext {
        self.context
    }

    /// Whether any live gate restricts read operations.
    pub async fn has_read_restrictions(&self) -> bool {
        self.has_restrictions(Operation::Read).await
    }

    /// Whether any live gate restricts create operations.
    pub async fn has_create_restrictions(&self) -> bool {
        self.has_restrictions(Operation::Create).await
    }

    /// Whether any live gate restricts update operations.
    pub async fn has_update_restrictions(&self) -> bool {
        self.has_restrictions(Operation::Update).await
    }

    /// Whether any live gate restricts delete operations.
    pub async fn has_delete_restrictions(&self) -> bool {
        self.has_restrictions(Operation::Delete).await
    }

    /// Whether any live gate restricts execute operations.
    pub async fn has_execute_restrictions(&self) -> bool {
        self.has_restrictions(Operation::Execute).await
    }

    /// Whether any live gate restricts child reordering.
    pub async fn has_order_children_restrictions(&self) -> bool {
        self.has_restrictions(Operation::OrderChildren).await
    }

    /// Whether every value of the resource may be read without
    /// per-value checks.
    pub async fn can_read_all_values(&self, resource_path: &str) -> bool {
        self.all_values_unrestricted(Operation::Read, resource_path)
            .await
    }

    /// Whether every value may be created without per-value checks.
    pub async fn can_create_all_values(&self, resource_path: &str) -> bool {
        self.all_values_unrestricted(Operation::Create, resource_path)
            .await
    }

    /// Whether every value may be updated without per-value checks.
    pub async fn can_update_all_values(&self, resource_path: &str) -> bool {
        self.all_values_unrestricted(Operation::Update, resource_path)
            .await
    }

    /// Whether every value may be deleted without per-value checks.
    pub async fn can_delete_all_values(&self, resource_path: &str) -> bool {
        self.all_values_unrestricted(Operation::Delete, resource_path)
            .await
    }

    /// True iff at least one registration declares the operation and
    /// its gate reports restrictions for it. The gate-side hint
    /// defaults to `true`, so for a gate that leaves it unimplemented
    /// this is a pure existence check.
    async fn has_restrictions(&self, operation: Operation) -> bool {
        self.registry
            .snapshot(self.context)
            .await
            .iter()
            .any(|registration| {
                registration.applies_to(operation)
                    && reports_restrictions(registration.gate(), operation)
            })
    }

    /// True iff every registration applicable to the resource's path
    /// reports all values accessible, vacuously true when none is
    /// registered there. The gate-side hint defaults to `false`, so
    /// an unimplemented gate keeps per-value checks in force.
    async fn all_values_unrestricted(&self, operation: Operation, resource_path: &str) -> bool {
        self.registry
            .snapshot(self.context)
            .await
            .iter()
            .filter(|registration| {
                registration.applies_to(operation) && registration.matches_path(resource_path)
            })
            .all(|registration| reports_all_values(registration.gate(), operation, resource_path))
    }
}

fn reports_restrictions(gate: &dyn AccessGate, operation: Operation) -> bool {
    match operation {
        Operation::Read => gate.has_read_restrictions(),
        Operation::Create => gate.has_create_restrictions(),
        Operation::Update => gate.has_update_restrictions(),
        Operation::Delete => gate.has_delete_restrictions(),
        Operation::Execute => gate.has_execute_restrictions(),
        Operation::OrderChildren => gate.has_order_children_restrictions(),
    }
}

fn reports_all_values(gate: &dyn AccessGate, operation: Operation, resource_path: &str) -> bool {
    match operation {
        Operation::Read => gate.can_read_all_values(resource_path),
        Operation::Create => gate.can_create_all_values(resource_path),
        Operation::Update => gate.can_update_all_values(resource_path),
        Operation::Delete => gate.can_delete_all_values(resource_path),
        // Value-level bulk hints exist only for the four value
        // operations.
        Operation::Execute | Operation::OrderChildren => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gatehouse_registry::GateRegistration;
    use gatehouse_types::GateResult;

    /// A gate that has fully classified its restrictions: it only
    /// restricts reads, and within its scope all values are readable.
    struct ReadOnlyRestrictor;

    #[async_trait]
    impl AccessGate for ReadOnlyRestrictor {
        fn name(&self) -> &str {
            "read-only"
        }

        async fn can_read(&self, _resource_path: &str) -> GateResult {
            GateResult::Denied
        }

        fn has_read_restrictions(&self) -> bool {
            true
        }

        fn has_create_restrictions(&self) -> bool {
            false
        }

        fn has_update_restrictions(&self) -> bool {
            false
        }

        fn has_delete_restrictions(&self) -> bool {
            false
        }

        fn has_execute_restrictions(&self) -> bool {
            false
        }

        fn has_order_children_restrictions(&self) -> bool {
            false
        }

        fn can_read_all_values(&self, _resource_path: &str) -> bool {
            true
        }
    }

    /// A bare-minimum gate that leaves every hint at its default.
    struct OpaqueGate;

    #[async_trait]
    impl AccessGate for OpaqueGate {
        fn name(&self) -> &str {
            "opaque"
        }
    }

    fn evaluator(registry: Arc<GateRegistry>) -> RestrictionPredicateEvaluator {
        RestrictionPredicateEvaluator::new(registry, AccessContext::Application)
    }

    #[tokio::test]
    async fn an_empty_registry_restricts_nothing() {
        let registry = Arc::new(GateRegistry::new());
        let predicates = evaluator(registry);

        assert!(!predicates.has_read_restrictions().await);
        assert!(!predicates.has_order_children_restrictions().await);
        assert!(predicates.can_read_all_values("/content/a").await);
        assert!(predicates.can_delete_all_values("/content/a").await);
    }

    #[tokio::test]
    async fn an_unimplemented_gate_counts_as_restricting() {
        let registry = Arc::new(GateRegistry::new());
        registry
            .register(
                GateRegistration::builder(Arc::new(OpaqueGate))
                    .context(AccessContext::Application)
                    .build()
                    .unwrap(),
            )
            .await;
        let predicates = evaluator(registry);

        // Conservative defaults: restrictions assumed, bulk value
        // access not assumed.
        assert!(predicates.has_read_restrictions().await);
        assert!(predicates.has_execute_restrictions().await);
        assert!(!predicates.can_read_all_values("/content/a").await);
    }

    #[tokio::test]
    async fn gate_hints_narrow_the_answers() {
        let registry = Arc::new(GateRegistry::new());
        registry
            .register(
                GateRegistration::builder(Arc::new(ReadOnlyRestrictor))
                    .context(AccessContext::Application)
                    .build()
                    .unwrap(),
            )
            .await;
        let predicates = evaluator(registry);

        assert!(predicates.has_read_restrictions().await);
        assert!(!predicates.has_create_restrictions().await);
        assert!(!predicates.has_delete_restrictions().await);
        assert!(predicates.can_read_all_values("/content/a").await);
        assert!(!predicates.can_update_all_values("/content/a").await);
    }

    #[tokio::test]
    async fn operation_scoping_limits_what_a_gate_restricts() {
        let registry = Arc::new(GateRegistry::new());
        registry
            .register(
                GateRegistration::builder(Arc::new(OpaqueGate))
                    .context(AccessContext::Application)
                    .operations([Operation::Delete])
                    .build()
                    .unwrap(),
            )
            .await;
        let predicates = evaluator(registry);

        assert!(predicates.has_delete_restrictions().await);
        assert!(!predicates.has_read_restrictions().await);
    }

    #[tokio::test]
    async fn bulk_value_checks_are_scoped_to_the_resource_path() {
        let registry = Arc::new(GateRegistry::new());
        registry
            .register(
                GateRegistration::builder(Arc::new(OpaqueGate))
                    .context(AccessContext::Application)
                    .path_pattern("/secure/.*")
                    .build()
                    .unwrap(),
            )
            .await;
        let predicates = evaluator(registry);

        assert!(!predicates.can_read_all_values("/secure/vault").await);
        assert!(predicates.can_read_all_values("/public/page").await);
    }
}
