//! Verdict combination for whole-resource and value-level requests.

use crate::decision::{DecisionCard, GateVerdict};
use futures::FutureExt;
use gatehouse_registry::{AccessGate, GateRegistration, GateRegistry};
use gatehouse_types::{AccessContext, DecisionRequest, GateResult, Operation};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Bound on a single gate decision call. One misbehaving gate must not
/// stall every authorization decision.
const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Combines per-gate verdicts into one authorization decision.
///
/// For each request the engine snapshots the applicable registrations
/// (context, path pattern, operation), orders them by ranking, and
/// folds their verdicts:
///
/// - a grant is unconditionally decisive;
/// - a denial is decisive only when the operation is among the
///   registration's final operations, otherwise it is remembered and
///   the fold continues;
/// - `CantDecide` contributes nothing, and is never final.
///
/// Exhausting the list yields the remembered denial if there was one,
/// otherwise the request is granted: zero applicable gates, or gates
/// that all abstain, resolve to a grant by explicit default-allow
/// policy.
pub struct DecisionEngine {
    registry: Arc<GateRegistry>,
    context: AccessContext,
    gate_timeout: Duration,
    audit: bool,
}

impl DecisionEngine {
    /// Create an engine bound to one context.
    pub fn new(registry: Arc<GateRegistry>, context: AccessContext) -> Self {
        Self {
            registry,
            context,
            gate_timeout: DEFAULT_GATE_TIMEOUT,
            audit: true,
        }
    }

    /// Bound each gate decision call to `gate_timeout`. A gate that
    /// exceeds it counts as `CantDecide`.
    pub fn with_gate_timeout(mut self, gate_timeout: Duration) -> Self {
        self.gate_timeout = gate_timeout;
        self
    }

    /// Enable or disable per-decision audit logging.
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    /// The context this engine evaluates in.
    pub fn context(&self) -> AccessContext {
        self.context
    }

    /// Combined verdict for a request.
    pub async fn evaluate(&self, request: &DecisionRequest) -> GateResult {
        self.evaluate_with_card(request).await.verdict
    }

    /// Combined verdict plus the per-gate audit trail.
    pub async fn evaluate_with_card(&self, request: &DecisionRequest) -> DecisionCard {
        debug!(
            path = %request.resource_path,
            operation = %request.operation,
            context = %request.context,
            value = request.value_name.as_deref(),
            "evaluating access request"
        );

        let applicable = self.applicable(request).await;
        let mut trail = Vec::with_capacity(applicable.len());
        let mut saw_denied = false;
        let mut decided = None;

        for registration in &applicable {
            let verdict = self.invoke(registration, request).await;
            match verdict {
                GateResult::Granted => {
                    trail.push(verdict_entry(registration, verdict, true));
                    decided = Some(GateResult::Granted);
                    break;
                }
                GateResult::Denied => {
                    saw_denied = true;
                    let decisive = registration.is_final_for(request.operation);
                    trail.push(verdict_entry(registration, verdict, decisive));
                    if decisive {
                        decided = Some(GateResult::Denied);
                        break;
                    }
                }
                GateResult::CantDecide => {
                    trail.push(verdict_entry(registration, verdict, false));
                }
            }
        }

        let verdict = decided.unwrap_or(if saw_denied {
            GateResult::Denied
        } else {
            GateResult::Granted
        });

        let card = DecisionCard::new(request, verdict, applicable.len(), trail);
        if self.audit {
            self.log_decision(&card);
        }
        card
    }

    /// Convenience: may the resource at `resource_path` be read?
    pub async fn can_read(&self, resource_path: &str) -> GateResult {
        self.evaluate_operation(resource_path, Operation::Read).await
    }

    /// Convenience: may a resource be created at `resource_path`?
    pub async fn can_create(&self, resource_path: &str) -> GateResult {
        self.evaluate_operation(resource_path, Operation::Create)
            .await
    }

    /// Convenience: may the resource at `resource_path` be updated?
    pub async fn can_update(&self, resource_path: &str) -> GateResult {
        self.evaluate_operation(resource_path, Operation::Update)
            .await
    }

    /// Convenience: may the resource at `resource_path` be deleted?
    pub async fn can_delete(&self, resource_path: &str) -> GateResult {
        self.evaluate_operation(resource_path, Operation::Delete)
            .await
    }

    /// Convenience: may the resource at `resource_path` be executed?
    pub async fn can_execute(&self, resource_path: &str) -> GateResult {
        self.evaluate_operation(resource_path, Operation::Execute)
            .await
    }

    /// Convenience: may the children of `resource_path` be reordered?
    pub async fn can_order_children(&self, resource_path: &str) -> GateResult {
        self.evaluate_operation(resource_path, Operation::OrderChildren)
            .await
    }

    /// Convenience: may the named value be read?
    pub async fn can_read_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.evaluate_value(resource_path, Operation::Read, value_name)
            .await
    }

    /// Convenience: may the named value be created?
    pub async fn can_create_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.evaluate_value(resource_path, Operation::Create, value_name)
            .await
    }

    /// Convenience: may the named value be updated?
    pub async fn can_update_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.evaluate_value(resource_path, Operation::Update, value_name)
            .await
    }

    /// Convenience: may the named value be deleted?
    pub async fn can_delete_value(&self, resource_path: &str, value_name: &str) -> GateResult {
        self.evaluate_value(resource_path, Operation::Delete, value_name)
            .await
    }

    async fn evaluate_operation(&self, resource_path: &str, operation: Operation) -> GateResult {
        self.evaluate(&DecisionRequest::new(resource_path, operation, self.context))
            .await
    }

    async fn evaluate_value(
        &self,
        resource_path: &str,
        operation: Operation,
        value_name: &str,
    ) -> GateResult {
        self.evaluate(&DecisionRequest::for_value(
            resource_path,
            operation,
            self.context,
            value_name,
        ))
        .await
    }

    /// The ordered registrations this request must be folded over.
    async fn applicable(&self, request: &DecisionRequest) -> Vec<Arc<GateRegistration>> {
        self.registry
            .snapshot(request.context)
            .await
            .into_iter()
            .filter(|registration| {
                registration.matches_path(&request.resource_path)
                    && registration.applies_to(request.operation)
            })
            .collect()
    }

    /// One contained gate call: a panic or a timeout downgrades this
    /// gate's verdict to `CantDecide` and never aborts the fold.
    async fn invoke(&self, registration: &GateRegistration, request: &DecisionRequest) -> GateResult {
        let call = dispatch(registration.gate(), request);
        match timeout(self.gate_timeout, AssertUnwindSafe(call).catch_unwind()).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(_)) => {
                warn!(
                    gate = registration.gate_name(),
                    operation = %request.operation,
                    "access gate panicked during decision, counting as cant-decide"
                );
                GateResult::CantDecide
            }
            Err(_) => {
                warn!(
                    gate = registration.gate_name(),
                    operation = %request.operation,
                    timeout_ms = self.gate_timeout.as_millis() as u64,
                    "access gate timed out, counting as cant-decide"
                );
                GateResult::CantDecide
            }
        }
    }

    fn log_decision(&self, card: &DecisionCard) {
        match card.verdict {
            GateResult::Denied => {
                warn!(
                    decision = %card.id,
                    path = %card.resource_path,
                    operation = %card.operation,
                    gates_consulted = card.gates_consulted(),
                    "access denied"
                );
            }
            _ => {
                info!(
                    decision = %card.id,
                    path = %card.resource_path,
                    operation = %card.operation,
                    gates_consulted = card.gates_consulted(),
                    "access granted"
                );
            }
        }
    }
}

/// Single dispatch point keyed by the requested operation, so the fold
/// stays one generic path instead of six copies.
async fn dispatch(gate: &dyn AccessGate, request: &DecisionRequest) -> GateResult {
    let path = request.resource_path.as_str();
    match (request.operation, request.value_name.as_deref()) {
        (Operation::Read, None) => gate.can_read(path).await,
        (Operation::Create, None) => gate.can_create(path).await,
        (Operation::Update, None) => gate.can_update(path).await,
        (Operation::Delete, None) => gate.can_delete(path).await,
        (Operation::Read, Some(value)) => gate.can_read_value(path, value).await,
        (Operation::Create, Some(value)) => gate.can_create_value(path, value).await,
        (Operation::Update, Some(value)) => gate.can_update_value(path, value).await,
        (Operation::Delete, Some(value)) => gate.can_delete_value(path, value).await,
        // No value-level form exists for these; the whole-resource
        // answer covers the value as well.
        (Operation::Execute, _) => gate.can_execute(path).await,
        (Operation::OrderChildren, _) => gate.can_order_children(path).await,
    }
}

fn verdict_entry(
    registration: &GateRegistration,
    verdict: GateResult,
    decisive: bool,
) -> GateVerdict {
    GateVerdict {
        gate: registration.gate_name().to_owned(),
        ranking: registration.ranking(),
        verdict,
        decisive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gatehouse_registry::GateRegistration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every decision call with one fixed verdict and counts
    /// how often it was consulted.
    struct FixedGate {
        name: &'static str,
        verdict: GateResult,
        calls: AtomicUsize,
    }

    impl FixedGate {
        fn new(name: &'static str, verdict: GateResult) -> Arc<Self> {
            Arc::new(Self {
                name,
                verdict,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer(&self) -> GateResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict
        }
    }

    #[async_trait]
    impl AccessGate for FixedGate {
        fn name(&self) -> &str {
            self.name
        }

        async fn can_read(&self, _resource_path: &str) -> GateResult {
            self.answer()
        }

        async fn can_delete(&self, _resource_path: &str) -> GateResult {
            self.answer()
        }

        async fn can_read_value(&self, _resource_path: &str, _value_name: &str) -> GateResult {
            self.answer()
        }
    }

    fn engine(registry: Arc<GateRegistry>) -> DecisionEngine {
        DecisionEngine::new(registry, AccessContext::Application).with_audit(false)
    }

    async fn register(
        registry: &GateRegistry,
        gate: Arc<FixedGate>,
        ranking: i32,
        final_operations: &[Operation],
    ) {
        registry
            .register(
                GateRegistration::builder(gate)
                    .context(AccessContext::Application)
                    .operations([Operation::Read])
                    .final_operations(final_operations.iter().copied())
                    .ranking(ranking)
                    .build()
                    .unwrap(),
            )
            .await;
    }

    #[tokio::test]
    async fn final_denial_stops_the_fold_before_lower_gates() {
        let registry = Arc::new(GateRegistry::new());
        let denier = FixedGate::new("denier", GateResult::Denied);
        let granter = FixedGate::new("granter", GateResult::Granted);
        register(&registry, denier.clone(), 10, &[Operation::Read]).await;
        register(&registry, granter.clone(), 5, &[]).await;

        let verdict = engine(registry).can_read("/content/a").await;

        assert_eq!(verdict, GateResult::Denied);
        assert_eq!(denier.calls(), 1);
        assert_eq!(granter.calls(), 0);
    }

    #[tokio::test]
    async fn a_grant_is_decisive_even_after_a_nonfinal_denial() {
        let registry = Arc::new(GateRegistry::new());
        let denier = FixedGate::new("denier", GateResult::Denied);
        let granter = FixedGate::new("granter", GateResult::Granted);
        let unreached = FixedGate::new("unreached", GateResult::Denied);
        register(&registry, denier, 10, &[]).await;
        register(&registry, granter, 5, &[]).await;
        register(&registry, unreached.clone(), 1, &[]).await;

        let verdict = engine(registry).can_read("/content/a").await;

        assert_eq!(verdict, GateResult::Granted);
        assert_eq!(unreached.calls(), 0);
    }

    #[tokio::test]
    async fn abstaining_gates_fall_through_to_a_lower_grant() {
        let registry = Arc::new(GateRegistry::new());
        register(
            &registry,
            FixedGate::new("abstains", GateResult::CantDecide),
            10,
            &[],
        )
        .await;
        register(
            &registry,
            FixedGate::new("grants", GateResult::Granted),
            5,
            &[],
        )
        .await;

        assert_eq!(
            engine(registry).can_read("/content/a").await,
            GateResult::Granted
        );
    }

    #[tokio::test]
    async fn cant_decide_is_never_final() {
        let registry = Arc::new(GateRegistry::new());
        let abstainer = FixedGate::new("abstainer", GateResult::CantDecide);
        let denier = FixedGate::new("denier", GateResult::Denied);
        // The abstainer lists read among its final operations; the
        // contract still requires the fold to continue past it.
        register(&registry, abstainer, 10, &[Operation::Read]).await;
        register(&registry, denier.clone(), 5, &[]).await;

        let verdict = engine(registry).can_read("/content/a").await;

        assert_eq!(verdict, GateResult::Denied);
        assert_eq!(denier.calls(), 1);
    }

    #[tokio::test]
    async fn no_applicable_gates_resolves_to_granted() {
        let registry = Arc::new(GateRegistry::new());
        assert_eq!(
            engine(registry.clone()).can_read("/anything").await,
            GateResult::Granted
        );

        // A registration scoped elsewhere changes nothing.
        register(&registry, FixedGate::new("scoped", GateResult::Denied), 0, &[]).await;
        let scoped = DecisionEngine::new(registry, AccessContext::Provider).with_audit(false);
        assert_eq!(scoped.can_read("/anything").await, GateResult::Granted);
    }

    #[tokio::test]
    async fn nonfinal_denials_survive_to_the_end_of_the_fold() {
        let registry = Arc::new(GateRegistry::new());
        register(&registry, FixedGate::new("denier", GateResult::Denied), 10, &[]).await;
        register(
            &registry,
            FixedGate::new("abstainer", GateResult::CantDecide),
            5,
            &[],
        )
        .await;

        assert_eq!(
            engine(registry).can_read("/content/a").await,
            GateResult::Denied
        );
    }

    #[tokio::test]
    async fn registrations_off_path_or_off_operation_are_skipped() {
        let registry = Arc::new(GateRegistry::new());
        let off_path = FixedGate::new("off-path", GateResult::Denied);
        let off_operation = FixedGate::new("off-operation", GateResult::Denied);
        registry
            .register(
                GateRegistration::builder(off_path.clone())
                    .context(AccessContext::Application)
                    .path_pattern("/secure/.*")
                    .build()
                    .unwrap(),
            )
            .await;
        registry
            .register(
                GateRegistration::builder(off_operation.clone())
                    .context(AccessContext::Application)
                    .operations([Operation::Delete])
                    .build()
                    .unwrap(),
            )
            .await;

        let verdict = engine(registry).can_read("/public/page").await;

        assert_eq!(verdict, GateResult::Granted);
        assert_eq!(off_path.calls(), 0);
        assert_eq!(off_operation.calls(), 0);
    }

    #[tokio::test]
    async fn value_requests_reach_the_value_method() {
        /// Denies the resource but grants one specific value.
        struct ValueGate;

        #[async_trait]
        impl AccessGate for ValueGate {
            fn name(&self) -> &str {
                "values"
            }

            async fn can_read(&self, _resource_path: &str) -> GateResult {
                GateResult::Denied
            }

            async fn can_read_value(&self, _resource_path: &str, value_name: &str) -> GateResult {
                if value_name == "title" {
                    GateResult::Granted
                } else {
                    GateResult::Denied
                }
            }
        }

        let registry = Arc::new(GateRegistry::new());
        registry
            .register(
                GateRegistration::builder(Arc::new(ValueGate))
                    .context(AccessContext::Application)
                    .build()
                    .unwrap(),
            )
            .await;
        let engine = engine(registry);

        assert_eq!(engine.can_read("/content/a").await, GateResult::Denied);
        assert_eq!(
            engine.can_read_value("/content/a", "title").await,
            GateResult::Granted
        );
        assert_eq!(
            engine.can_read_value("/content/a", "secret").await,
            GateResult::Denied
        );
    }

    #[tokio::test]
    async fn the_card_records_the_trail_in_evaluation_order() {
        let registry = Arc::new(GateRegistry::new());
        register(
            &registry,
            FixedGate::new("abstainer", GateResult::CantDecide),
            10,
            &[],
        )
        .await;
        register(&registry, FixedGate::new("denier", GateResult::Denied), 5, &[Operation::Read])
            .await;
        register(&registry, FixedGate::new("shadowed", GateResult::Granted), 1, &[]).await;

        let card = engine(registry)
            .evaluate_with_card(&DecisionRequest::new(
                "/content/a",
                Operation::Read,
                AccessContext::Application,
            ))
            .await;

        assert_eq!(card.verdict, GateResult::Denied);
        assert_eq!(card.gates_matched, 3);
        assert_eq!(card.gates_consulted(), 2);
        assert_eq!(card.trail[0].gate, "abstainer");
        assert!(!card.trail[0].decisive);
        assert_eq!(card.trail[1].gate, "denier");
        assert!(card.trail[1].decisive);
    }
}
