//! Gateway boundary to the persistence layer.

use crate::entity::Identifier;
use crate::error::CoreResult;
use crate::events::StateChanged;
use crate::facts::LinkFacts;
use crate::link::Link;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use tracing::debug;

/// Access to persisted link facts.
///
/// This trait abstracts the persistence layer, allowing for different
/// implementations (database tables, files, in-memory for testing, etc.).
/// It is the only channel by which state transitions become durable.
pub trait LinkGateway {
    /// Materializes a fresh link from the currently persisted facts.
    fn create_link(&self) -> CoreResult<Link>;

    /// Performs the persistence mutation of each update, in order.
    ///
    /// If an update fails, earlier updates may already be durable; no
    /// atomicity is promised beyond what the implementation provides.
    fn apply(&self, updates: &[StateChanged]) -> CoreResult<()>;
}

/// An in-memory gateway.
///
/// Besides the gateway contract it exposes source-side mutations
/// ([`add_to_source`](Self::add_to_source), [`taint`](Self::taint)) that
/// stand in for the authoritative store.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    facts: RwLock<LinkFacts>,
    applied: RwLock<Vec<StateChanged>>,
}

impl MemoryGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway holding `facts`.
    #[must_use]
    pub fn with_facts(facts: LinkFacts) -> Self {
        Self {
            facts: RwLock::new(facts),
            applied: RwLock::new(Vec::new()),
        }
    }

    /// Returns a copy of the current facts.
    #[must_use]
    pub fn facts(&self) -> LinkFacts {
        self.facts.read().clone()
    }

    /// Replaces the current facts.
    pub fn replace_facts(&self, facts: LinkFacts) {
        *self.facts.write() = facts;
    }

    /// Returns every update applied so far, in order.
    #[must_use]
    pub fn applied(&self) -> Vec<StateChanged> {
        self.applied.read().clone()
    }

    /// Registers identifiers in the source.
    pub fn add_to_source<I>(&self, identifiers: I)
    where
        I: IntoIterator<Item = Identifier>,
    {
        self.facts.write().source.extend(identifiers);
    }

    /// Flags source identifiers as faulty.
    ///
    /// Identifiers not present in the source are ignored.
    pub fn taint<I>(&self, identifiers: I)
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut facts = self.facts.write();
        for id in identifiers {
            if facts.source.contains(&id) {
                facts.tainted.insert(id);
            }
        }
    }

    /// Clears the faulty flag of identifiers.
    ///
    /// Deprecated identifiers keep their flag and are returned.
    pub fn untaint<I>(&self, identifiers: I) -> BTreeSet<Identifier>
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut facts = self.facts.write();
        identifiers
            .into_iter()
            .filter(|id| !facts.untaint(id))
            .collect()
    }
}

impl LinkGateway for MemoryGateway {
    fn create_link(&self) -> CoreResult<Link> {
        Link::create(&self.facts.read())
    }

    fn apply(&self, updates: &[StateChanged]) -> CoreResult<()> {
        let mut facts = self.facts.write();
        let mut applied = self.applied.write();
        for update in updates {
            debug!(
                identifier = %update.identifier,
                command = %update.command,
                "applying update"
            );
            facts.apply_update(update);
            applied.push(update.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Command, State};
    use crate::types::Operation;

    fn ids(tokens: &[&str]) -> BTreeSet<Identifier> {
        tokens.iter().copied().map(Identifier::from).collect()
    }

    #[test]
    fn create_link_reflects_facts() {
        let gateway = MemoryGateway::new();
        gateway.add_to_source(ids(&["1", "2"]));

        let link = gateway.create_link().unwrap();
        assert_eq!(link.len(), 2);
        assert_eq!(link.identifiers_with_state(State::Unshared), ids(&["1", "2"]));
    }

    #[test]
    fn taint_ignores_unknown_identifiers() {
        let gateway = MemoryGateway::new();
        gateway.add_to_source(ids(&["1"]));
        gateway.taint(ids(&["1", "2"]));

        assert_eq!(gateway.facts().tainted, ids(&["1"]));

        assert!(gateway.untaint(ids(&["1"])).is_empty());
        assert!(gateway.facts().tainted.is_empty());
    }

    #[test]
    fn untaint_leaves_deprecated_flagged() {
        let gateway = MemoryGateway::new();
        gateway.add_to_source(ids(&["1"]));
        gateway.taint(ids(&["1"]));
        for operation in [Operation::StartPull, Operation::Process] {
            let mut link = gateway.create_link().unwrap();
            let result = link.apply(operation, &ids(&["1"])).unwrap();
            gateway.apply(&result.updates).unwrap();
        }
        let link = gateway.create_link().unwrap();
        assert_eq!(link.identifiers_with_state(State::Deprecated), ids(&["1"]));

        let kept = gateway.untaint(ids(&["1"]));

        assert_eq!(kept, ids(&["1"]));
        let link = gateway.create_link().unwrap();
        assert_eq!(link.identifiers_with_state(State::Deprecated), ids(&["1"]));
    }

    #[test]
    fn apply_persists_and_records_updates() {
        let gateway = MemoryGateway::new();
        gateway.add_to_source(ids(&["1"]));

        let mut link = gateway.create_link().unwrap();
        let result = link.apply(Operation::StartPull, &ids(&["1"])).unwrap();
        gateway.apply(&result.updates).unwrap();

        assert_eq!(gateway.facts().pull, ids(&["1"]));
        assert_eq!(gateway.applied().len(), 1);
        assert_eq!(gateway.applied()[0].command, Command::StartPullProcess);
        assert_eq!(gateway.create_link().unwrap(), link);
    }
}
