// ── Synchronization engine ──
//
// Pull imports a network's applications and devices into the local
// store; push exports locally linked entities to the network. Both use
// the protocol data store as the create-vs-skip guard.

mod pull;
mod push;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::model::{LocalId, NetworkId, RemoteId};
use crate::store::{EntityKind, LocalStore, ProtocolDataStore};

pub struct SyncEngine {
    locals: Arc<dyn LocalStore>,
    data: Arc<dyn ProtocolDataStore>,
}

impl SyncEngine {
    pub fn new(locals: Arc<dyn LocalStore>, data: Arc<dyn ProtocolDataStore>) -> Self {
        Self { locals, data }
    }

    pub fn locals(&self) -> &Arc<dyn LocalStore> {
        &self.locals
    }

    pub fn data(&self) -> &Arc<dyn ProtocolDataStore> {
        &self.data
    }
}

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Confirm a stored application mapping still resolves remotely
    /// before trusting it. An explicit not-found drops the mapping and
    /// re-creates the application.
    pub verify_mappings: bool,
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SyncOutcome {
    /// A new mapping to `remote_id` was recorded.
    Created { remote_id: RemoteId },
    /// Local record made from a profile the network has no resource for.
    Synthesized,
    AlreadySynced,
    Failed { reason: String },
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { remote_id } => write!(f, "created ({remote_id})"),
            Self::Synthesized => f.write_str("synthesized"),
            Self::AlreadySynced => f.write_str("already synced"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub kind: EntityKind,
    pub local_id: LocalId,
    pub name: String,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub network_id: NetworkId,
    pub entries: Vec<EntityReport>,
}

impl SyncReport {
    pub fn new(network_id: NetworkId) -> Self {
        Self {
            network_id,
            entries: Vec::new(),
        }
    }

    pub(crate) fn record(
        &mut self,
        kind: EntityKind,
        local_id: LocalId,
        name: impl Into<String>,
        outcome: SyncOutcome,
    ) {
        self.entries.push(EntityReport {
            kind,
            local_id,
            name: name.into(),
            outcome,
        });
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Created { .. } | SyncOutcome::Synthesized))
    }

    pub fn already_synced(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::AlreadySynced))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed { .. }))
    }

    pub fn outcome_of(&self, kind: EntityKind, local_id: LocalId) -> Option<&SyncOutcome> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.local_id == local_id)
            .map(|e| &e.outcome)
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}
