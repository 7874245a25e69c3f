//! The live set of gate registrations.

use crate::error::RegistrationError;
use crate::gate::AccessGate;
use crate::registration::GateRegistration;
use gatehouse_types::AccessContext;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Handle identifying one live registration, for later withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registration:{}", self.0)
    }
}

/// The shared, mutable collection of live gate registrations.
///
/// Registrars add and withdraw registrations at arbitrary times;
/// evaluations read consistent snapshots. The write lock is only held
/// for the insert/remove and re-sort itself, and a snapshot clones the
/// entry list out under the read lock, so no lock is ever held across
/// a gate invocation.
pub struct GateRegistry {
    entries: RwLock<Vec<Arc<GateRegistration>>>,
    next_seq: AtomicU64,
}

impl GateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Add a registration and make it visible to evaluation.
    ///
    /// Entries are kept ordered by ranking, descending, with ties
    /// broken by insertion order.
    pub async fn register(&self, registration: GateRegistration) -> RegistrationId {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let registration = Arc::new(registration.assigned(seq));
        debug!(
            gate = registration.gate_name(),
            context = %registration.context(),
            ranking = registration.ranking(),
            pattern = registration.path_pattern(),
            "registered access gate"
        );

        let mut entries = self.entries.write().await;
        entries.push(registration);
        entries.sort_by(|a, b| b.ranking().cmp(&a.ranking()).then(a.seq().cmp(&b.seq())));
        RegistrationId(seq)
    }

    /// Build a registration from registrar-supplied options and add
    /// it.
    ///
    /// A malformed registration is logged and excluded; it never
    /// disturbs the registrations already live.
    pub async fn register_from_options(
        &self,
        gate: Arc<dyn AccessGate>,
        options: &HashMap<String, String>,
    ) -> Result<RegistrationId, RegistrationError> {
        let gate_name = gate.name().to_owned();
        match GateRegistration::from_options(gate, options) {
            Ok(registration) => Ok(self.register(registration).await),
            Err(err) => {
                warn!(gate = %gate_name, error = %err, "rejecting access gate registration");
                Err(err)
            }
        }
    }

    /// Withdraw a registration. Returns `false` when the id is not
    /// (or no longer) live. In-flight evaluations that already took a
    /// snapshot keep seeing the withdrawn entry until they finish.
    pub async fn withdraw(&self, id: RegistrationId) -> bool {
        let mut entries = self.entries.write().await;
        let len_before = entries.len();
        entries.retain(|registration| registration.seq() != id.0);
        let removed = entries.len() < len_before;
        if removed {
            debug!(%id, "withdrew access gate registration");
        }
        removed
    }

    /// A consistent, ordered snapshot of the registrations for
    /// `context`.
    ///
    /// The returned list is un-torn: mutations after the snapshot are
    /// not observed by the caller's fold.
    pub async fn snapshot(&self, context: AccessContext) -> Vec<Arc<GateRegistration>> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|registration| registration.context() == context)
            .cloned()
            .collect()
    }

    /// Number of live registrations across both contexts.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the registry holds no registrations at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for GateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
