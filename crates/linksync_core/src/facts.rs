//! Persisted presence, taint and process facts.

use crate::entity::Identifier;
use crate::events::StateChanged;
use crate::state::{Command, PersistentState, Presence, State};
use crate::types::{Component, Process};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything a gateway persists about the link.
///
/// A [`Link`](crate::Link) is derived from these facts, and
/// [`LinkFacts::apply_update`] realizes the [`Command`] of each committed
/// state change on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFacts {
    /// Identifiers present in the source.
    #[serde(default)]
    pub source: BTreeSet<Identifier>,
    /// Identifiers present in the outbound ledger.
    #[serde(default)]
    pub outbound: BTreeSet<Identifier>,
    /// Identifiers present in the local store.
    #[serde(default)]
    pub local: BTreeSet<Identifier>,
    /// Identifiers the source flagged as faulty.
    #[serde(default)]
    pub tainted: BTreeSet<Identifier>,
    /// Identifiers with a pull process in flight.
    #[serde(default)]
    pub pull: BTreeSet<Identifier>,
    /// Identifiers with a delete process in flight.
    #[serde(default)]
    pub delete: BTreeSet<Identifier>,
}

impl LinkFacts {
    /// Creates empty facts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifiers present in `component`.
    #[must_use]
    pub fn component(&self, component: Component) -> &BTreeSet<Identifier> {
        match component {
            Component::Source => &self.source,
            Component::Outbound => &self.outbound,
            Component::Local => &self.local,
        }
    }

    /// Returns the components holding `identifier`.
    #[must_use]
    pub fn presence(&self, identifier: &Identifier) -> Presence {
        Component::ALL
            .into_iter()
            .filter(|component| self.component(*component).contains(identifier))
            .collect()
    }

    /// Returns the process recorded for `identifier`.
    #[must_use]
    pub fn process(&self, identifier: &Identifier) -> Process {
        if self.pull.contains(identifier) {
            Process::Pull
        } else if self.delete.contains(identifier) {
            Process::Delete
        } else {
            Process::None
        }
    }

    /// Clears the taint flag of `identifier`.
    ///
    /// A deprecated record keeps its flag: without it, its facts match no
    /// state. Returns false if the flag was kept.
    pub fn untaint(&mut self, identifier: &Identifier) -> bool {
        if !self.tainted.contains(identifier) {
            return true;
        }
        let untainted = PersistentState::new(
            self.presence(identifier),
            false,
            self.process(identifier).is_active(),
        );
        if State::from_persistent(identifier, untainted).is_err() {
            return false;
        }
        self.tainted.remove(identifier)
    }

    /// Applies the command of one committed state change.
    pub fn apply_update(&mut self, update: &StateChanged) {
        let id = update.identifier.clone();
        match update.command {
            Command::StartPullProcess => {
                self.outbound.insert(id.clone());
                self.pull.insert(id);
            }
            Command::AddToLocal => {
                self.local.insert(id);
            }
            Command::FinishPullProcess => {
                self.pull.remove(&id);
            }
            Command::StartDeleteProcess => {
                self.delete.insert(id);
            }
            Command::RemoveFromLocal => {
                self.local.remove(&id);
            }
            Command::FinishDeleteProcess => {
                self.outbound.remove(&id);
                self.delete.remove(&id);
            }
            Command::Deprecate => {
                self.pull.remove(&id);
                self.delete.remove(&id);
            }
        }
    }
}
