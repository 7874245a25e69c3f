//! Query rewriting across applicable gates.

use gatehouse_registry::GateRegistry;
use gatehouse_types::{AccessContext, QueryTransformError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Chains query rewrites across the gates of one context.
///
/// Transformation is not operation- or path-scoped: every live
/// registration of the context participates, in ranking order, each
/// gate receiving the previous gate's output. The chain is advisory:
/// it narrows result sets up front, while every individual result
/// stays subject to the read checks. A failing step is still fatal,
/// since the partially transformed query must never be used; the
/// first error aborts the chain and propagates to the caller.
pub struct QueryTransformer {
    registry: Arc<GateRegistry>,
    context: AccessContext,
}

impl QueryTransformer {
    /// Create a transformer bound to one context.
    pub fn new(registry: Arc<GateRegistry>, context: AccessContext) -> Self {
        Self { registry, context }
    }

    /// The context this transformer serves.
    pub fn context(&self) -> AccessContext {
        self.context
    }

    /// Thread `query` through every gate of the context, highest
    /// ranking first. Returns the original string untouched when no
    /// gate rewrites it.
    pub async fn transform(
        &self,
        query: &str,
        language: &str,
    ) -> Result<String, QueryTransformError> {
        let registrations = self.registry.snapshot(self.context).await;

        let mut transformed = query.to_owned();
        for registration in &registrations {
            transformed = registration
                .gate()
                .transform_query(&transformed, language)
                .await
                .map_err(|err| {
                    warn!(
                        gate = registration.gate_name(),
                        language, "query transformation aborted"
                    );
                    err
                })?;
        }

        if transformed != query {
            debug!(
                language,
                gates = registrations.len(),
                "query transformed before execution"
            );
        }
        Ok(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gatehouse_registry::{AccessGate, GateRegistration};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Appends a fixed clause to every query it sees.
    struct AppendGate {
        name: &'static str,
        clause: &'static str,
    }

    #[async_trait]
    impl AccessGate for AppendGate {
        fn name(&self) -> &str {
            self.name
        }

        async fn transform_query(
            &self,
            query: &str,
            _language: &str,
        ) -> Result<String, QueryTransformError> {
            Ok(format!("{query}{}", self.clause))
        }
    }

    /// Refuses to rewrite anything, counting the attempts.
    struct FailingGate {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AccessGate for FailingGate {
        fn name(&self) -> &str {
            "failing"
        }

        async fn transform_query(
            &self,
            _query: &str,
            _language: &str,
        ) -> Result<String, QueryTransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(QueryTransformError::new("failing", "unsupported language"))
        }
    }

    async fn register(registry: &GateRegistry, gate: Arc<dyn AccessGate>, ranking: i32) {
        registry
            .register(
                GateRegistration::builder(gate)
                    .context(AccessContext::Application)
                    .ranking(ranking)
                    .build()
                    .unwrap(),
            )
            .await;
    }

    fn transformer(registry: Arc<GateRegistry>) -> QueryTransformer {
        QueryTransformer::new(registry, AccessContext::Application)
    }

    #[tokio::test]
    async fn rewrites_chain_in_ranking_order() {
        let registry = Arc::new(GateRegistry::new());
        register(
            &registry,
            Arc::new(AppendGate {
                name: "a",
                clause: " AND x=1",
            }),
            10,
        )
        .await;
        register(
            &registry,
            Arc::new(AppendGate {
                name: "b",
                clause: " AND y=2",
            }),
            5,
        )
        .await;

        let result = transformer(registry)
            .transform("SELECT *", "sql")
            .await
            .unwrap();

        assert_eq!(result, "SELECT * AND x=1 AND y=2");
    }

    #[tokio::test]
    async fn an_untouched_query_comes_back_unchanged() {
        let registry = Arc::new(GateRegistry::new());

        // No gates at all.
        let result = transformer(registry.clone())
            .transform("SELECT *", "sql")
            .await
            .unwrap();
        assert_eq!(result, "SELECT *");

        // A gate with the identity default.
        struct PassiveGate;
        #[async_trait]
        impl AccessGate for PassiveGate {
            fn name(&self) -> &str {
                "passive"
            }
        }
        register(&registry, Arc::new(PassiveGate), 0).await;
        let result = transformer(registry)
            .transform("SELECT *", "sql")
            .await
            .unwrap();
        assert_eq!(result, "SELECT *");
    }

    #[tokio::test]
    async fn the_first_failure_aborts_the_chain() {
        let registry = Arc::new(GateRegistry::new());
        let reached = Arc::new(FailingGate {
            calls: AtomicUsize::new(0),
        });
        let unreached = Arc::new(AppendGate {
            name: "late",
            clause: " AND z=3",
        });
        register(&registry, reached.clone(), 10).await;
        register(&registry, unreached, 5).await;

        let err = transformer(registry)
            .transform("SELECT *", "sql")
            .await
            .unwrap_err();

        assert_eq!(err, QueryTransformError::new("failing", "unsupported language"));
        assert_eq!(reached.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transformation_ignores_the_other_context() {
        let registry = Arc::new(GateRegistry::new());
        registry
            .register(
                GateRegistration::builder(Arc::new(AppendGate {
                    name: "provider-only",
                    clause: " AND p=1",
                }))
                .context(AccessContext::Provider)
                .build()
                .unwrap(),
            )
            .await;

        let result = transformer(registry)
            .transform("SELECT *", "sql")
            .await
            .unwrap();
        assert_eq!(result, "SELECT *");
    }
}
