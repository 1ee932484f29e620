//! The link aggregate.

use crate::entity::{Entity, Identifier};
use crate::error::{CoreError, CoreResult};
use crate::events::{EntityOperationResult, LinkStateChanged};
use crate::facts::LinkFacts;
use crate::state::{PersistentState, State};
use crate::types::{Component, Operation, Process};
use std::collections::{BTreeMap, BTreeSet};

/// All entities known to the source, with their lifecycle state.
///
/// A link is a snapshot: it is built from [`LinkFacts`] and owns its
/// entities for the duration of one unit of work.
///
/// ## Invariants
///
/// - `local ⊆ outbound ⊆ source`
/// - `tainted ⊆ source`
/// - Pull and delete processes are disjoint and only exist in outbound
/// - Every identifier maps to exactly one [`State`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Link {
    entities: BTreeMap<Identifier, Entity>,
}

impl Link {
    /// Creates a link from persisted facts.
    ///
    /// Fails with `InvariantViolated` or `UnreachableState` if the facts
    /// are inconsistent.
    pub fn create(facts: &LinkFacts) -> CoreResult<Self> {
        check_subset(&facts.outbound, "outbound", &facts.source, "source")?;
        check_subset(&facts.local, "local", &facts.outbound, "outbound")?;
        check_subset(&facts.tainted, "tainted", &facts.source, "source")?;
        check_subset(&facts.pull, "pull process", &facts.outbound, "outbound")?;
        check_subset(&facts.delete, "delete process", &facts.outbound, "outbound")?;

        if let Some(id) = facts.pull.intersection(&facts.delete).next() {
            return Err(CoreError::invariant(format!(
                "{id} has both a pull and a delete process"
            )));
        }

        let mut entities = BTreeMap::new();
        for id in &facts.source {
            let process = facts.process(id);
            let is_tainted = facts.tainted.contains(id);
            let persistent =
                PersistentState::new(facts.presence(id), is_tainted, process.is_active());
            let state = State::from_persistent(id, persistent)?;
            entities.insert(id.clone(), Entity::new(id.clone(), state, process, is_tainted));
        }

        Ok(Self { entities })
    }

    /// Converts the link back into persisted facts.
    #[must_use]
    pub fn to_facts(&self) -> LinkFacts {
        let mut facts = LinkFacts::new();
        for (id, entity) in &self.entities {
            let presence = entity.state().presence();
            for component in presence.components() {
                let set = match component {
                    Component::Source => &mut facts.source,
                    Component::Outbound => &mut facts.outbound,
                    Component::Local => &mut facts.local,
                };
                set.insert(id.clone());
            }
            if entity.is_tainted() {
                facts.tainted.insert(id.clone());
            }
            match entity.current_process() {
                Process::Pull => {
                    facts.pull.insert(id.clone());
                }
                Process::Delete => {
                    facts.delete.insert(id.clone());
                }
                Process::None => {}
            }
        }
        facts
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the link holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the entity for `identifier`.
    #[must_use]
    pub fn entity(&self, identifier: &Identifier) -> Option<&Entity> {
        self.entities.get(identifier)
    }

    /// Returns a mutable entity for `identifier`.
    pub(crate) fn entity_mut(&mut self, identifier: &Identifier) -> Option<&mut Entity> {
        self.entities.get_mut(identifier)
    }

    /// Iterates over all entities ordered by identifier.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Returns every identifier (the identifiers present in the source).
    #[must_use]
    pub fn identifiers(&self) -> BTreeSet<Identifier> {
        self.entities.keys().cloned().collect()
    }

    /// Returns the identifiers present in `component`.
    #[must_use]
    pub fn identifiers_in(&self, component: Component) -> BTreeSet<Identifier> {
        self.select(|entity| entity.state().presence().contains(component))
    }

    /// Returns the identifiers in `state`.
    #[must_use]
    pub fn identifiers_with_state(&self, state: State) -> BTreeSet<Identifier> {
        self.select(|entity| entity.state() == state)
    }

    /// Returns the tainted identifiers.
    #[must_use]
    pub fn tainted_identifiers(&self) -> BTreeSet<Identifier> {
        self.select(Entity::is_tainted)
    }

    /// Returns the identifiers with `process` in flight.
    #[must_use]
    pub fn process_identifiers(&self, process: Process) -> BTreeSet<Identifier> {
        self.select(|entity| entity.current_process() == process)
    }

    fn select(&self, predicate: impl Fn(&Entity) -> bool) -> BTreeSet<Identifier> {
        self.entities
            .values()
            .filter(|entity| predicate(entity))
            .map(|entity| entity.identifier().clone())
            .collect()
    }

    /// Applies `operation` to every requested entity.
    ///
    /// Entities outside `requested` are left untouched. The outcome of each
    /// requested entity lands in exactly one of `updates` or `errors`.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolated` without touching any entity if
    /// `requested` is empty or names an identifier not present in the source.
    pub fn apply(
        &mut self,
        operation: Operation,
        requested: &BTreeSet<Identifier>,
    ) -> CoreResult<LinkStateChanged> {
        self.check_requested(requested)?;

        let mut updates = Vec::new();
        let mut errors = Vec::new();
        for id in requested {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            match entity.apply(operation) {
                EntityOperationResult::Updated(update) => updates.push(update),
                EntityOperationResult::Rejected(error) => errors.push(error),
            }
        }

        Ok(LinkStateChanged {
            operation,
            requested: requested.clone(),
            updates,
            errors,
        })
    }

    /// Checks that `requested` is non-empty and a subset of the source.
    pub fn check_requested(&self, requested: &BTreeSet<Identifier>) -> CoreResult<()> {
        if requested.is_empty() {
            return Err(CoreError::precondition(
                "requested identifiers must not be empty",
            ));
        }
        if let Some(unknown) = requested.iter().find(|id| !self.entities.contains_key(*id)) {
            return Err(CoreError::precondition(format!(
                "requested identifier {unknown} is not present in source"
            )));
        }
        Ok(())
    }
}

fn check_subset(
    subset: &BTreeSet<Identifier>,
    subset_name: &str,
    superset: &BTreeSet<Identifier>,
    superset_name: &str,
) -> CoreResult<()> {
    match subset.difference(superset).next() {
        Some(id) => Err(CoreError::invariant(format!(
            "{id} is in {subset_name} but not in {superset_name}"
        ))),
        None => Ok(()),
    }
}
