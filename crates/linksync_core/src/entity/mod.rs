//! Entities and their identifiers.

mod id;

pub use id::Identifier;

use crate::events::{EntityOperationResult, InvalidOperationRequested, StateChanged, Transition};
use crate::state::{transition, State};
use crate::types::{Operation, Process};

/// One record as seen by the lifecycle state machine.
///
/// Entities are materialized from persisted facts each time a
/// [`Link`](crate::Link) is created and only change through [`Entity::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    identifier: Identifier,
    state: State,
    current_process: Process,
    is_tainted: bool,
}

impl Entity {
    /// Creates an entity.
    pub(crate) fn new(
        identifier: Identifier,
        state: State,
        current_process: Process,
        is_tainted: bool,
    ) -> Self {
        Self {
            identifier,
            state,
            current_process,
            is_tainted,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the process in flight.
    #[must_use]
    pub fn current_process(&self) -> Process {
        self.current_process
    }

    /// Returns true if the source flagged this record.
    #[must_use]
    pub fn is_tainted(&self) -> bool {
        self.is_tainted
    }

    /// Applies an operation.
    ///
    /// On a valid operation the entity moves to its new state and the
    /// transition is returned as [`EntityOperationResult::Updated`]. An
    /// operation the current state does not define leaves the entity
    /// untouched and yields [`EntityOperationResult::Rejected`].
    pub fn apply(&mut self, operation: Operation) -> EntityOperationResult {
        match transition(self.state, self.current_process, self.is_tainted, operation) {
            Some(target) => {
                let from = self.state;
                self.state = target.state;
                self.current_process = target.process;
                EntityOperationResult::Updated(StateChanged {
                    operation,
                    identifier: self.identifier.clone(),
                    transition: Transition::new(from, target.state),
                    command: target.command,
                })
            }
            None => EntityOperationResult::Rejected(InvalidOperationRequested {
                operation,
                identifier: self.identifier.clone(),
                state: self.state,
            }),
        }
    }
}
