//! Records produced by applying operations.
//!
//! Both outcomes of an operation are ordinary data:
//! - [`StateChanged`]: the entity moved to a new state and the gateway must
//!   execute [`Command`]
//! - [`InvalidOperationRequested`]: the state does not define the operation
//!   and nothing changed

use crate::entity::Identifier;
use crate::state::{Command, State};
use crate::types::Operation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A move between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// State before the operation.
    pub from: State,
    /// State after the operation.
    pub to: State,
}

impl Transition {
    /// Creates a transition.
    #[must_use]
    pub const fn new(from: State, to: State) -> Self {
        Self { from, to }
    }

    /// Returns true if the state actually differs.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// An entity changed state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateChanged {
    /// The operation that caused the change.
    pub operation: Operation,
    /// The entity that changed.
    pub identifier: Identifier,
    /// Old and new state.
    pub transition: Transition,
    /// The persistence mutation realizing the change.
    pub command: Command,
}

/// An operation was requested in a state that does not define it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvalidOperationRequested {
    /// The rejected operation.
    pub operation: Operation,
    /// The entity the operation was requested for.
    pub identifier: Identifier,
    /// The unchanged state of the entity.
    pub state: State,
}

/// Outcome of applying one operation to one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityOperationResult {
    /// The entity changed state.
    Updated(StateChanged),
    /// The operation was rejected; the entity is unchanged.
    Rejected(InvalidOperationRequested),
}

impl EntityOperationResult {
    /// Returns the identifier of the entity the operation was applied to.
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        match self {
            EntityOperationResult::Updated(update) => &update.identifier,
            EntityOperationResult::Rejected(error) => &error.identifier,
        }
    }

    /// Returns true if the entity changed state.
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(self, EntityOperationResult::Updated(_))
    }
}

/// Combined outcome of applying one operation to a batch of entities.
///
/// Every requested identifier appears exactly once, either in `updates` or
/// in `errors`. Both lists are ordered by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStateChanged {
    /// The applied operation.
    pub operation: Operation,
    /// The identifiers the operation was requested for.
    pub requested: BTreeSet<Identifier>,
    /// Entities that changed state.
    pub updates: Vec<StateChanged>,
    /// Entities that rejected the operation.
    pub errors: Vec<InvalidOperationRequested>,
}

impl LinkStateChanged {
    /// Returns true if no entity changed state in this batch.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.updates.is_empty()
    }

    /// Returns the identifiers that changed state.
    #[must_use]
    pub fn updated_identifiers(&self) -> BTreeSet<Identifier> {
        self.updates
            .iter()
            .map(|update| update.identifier.clone())
            .collect()
    }
}
