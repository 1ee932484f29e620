//! Entity lifecycle states and the transition table.
//!
//! ```text
//! Unshared ──start_pull──► Activated(pull) ──process──► Received(pull) ──process──► Shared | Tainted
//! Shared | Tainted ──start_delete──► Received(delete) ──process──► Activated(delete) ──process──► Unshared
//! Activated(pull | delete), tainted ──process──► Deprecated
//! ```
//!
//! Taint is only inspected while `process` leaves `Activated` or `Received`.

use crate::entity::Identifier;
use crate::error::{CoreError, CoreResult};
use crate::types::{Component, Operation, Process};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The set of components holding a copy of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Presence(u8);

impl Presence {
    /// Present nowhere.
    pub const NONE: Self = Self(0);
    /// Present only in the source.
    pub const SOURCE: Self = Self(0b001);
    /// Present in the source and the outbound ledger.
    pub const SOURCE_OUTBOUND: Self = Self(0b011);
    /// Present in every component.
    pub const ALL: Self = Self(0b111);

    const fn bit(component: Component) -> u8 {
        match component {
            Component::Source => 0b001,
            Component::Outbound => 0b010,
            Component::Local => 0b100,
        }
    }

    /// Returns a copy that also contains `component`.
    #[must_use]
    pub const fn with(self, component: Component) -> Self {
        Self(self.0 | Self::bit(component))
    }

    /// Returns true if `component` holds the record.
    #[must_use]
    pub const fn contains(self, component: Component) -> bool {
        self.0 & Self::bit(component) != 0
    }

    /// Returns true if no component holds the record.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the components holding the record, in replication order.
    pub fn components(self) -> impl Iterator<Item = Component> {
        Component::ALL
            .into_iter()
            .filter(move |component| self.contains(*component))
    }
}

impl FromIterator<Component> for Presence {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Presence::NONE, |presence, component| presence.with(component))
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.components().map(Component::name).collect();
        f.write_str(&names.join("+"))
    }
}

/// Persisted facts about one identifier, from which its state is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersistentState {
    /// Components holding the record.
    pub presence: Presence,
    /// Whether the source flagged the record as faulty.
    pub is_tainted: bool,
    /// Whether a process is in flight.
    pub has_process: bool,
}

impl PersistentState {
    /// Creates a persistent state.
    #[must_use]
    pub const fn new(presence: Presence, is_tainted: bool, has_process: bool) -> Self {
        Self {
            presence,
            is_tainted,
            has_process,
        }
    }
}

/// Logical lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Present only in the source.
    Unshared,
    /// Present in source and outbound, mid pull or delete.
    Activated,
    /// Present in all components, mid pull or delete.
    Received,
    /// Present in all components, settled.
    Shared,
    /// Present in all components, flagged by the source.
    Tainted,
    /// Present in source and outbound, withdrawn after having been tainted.
    Deprecated,
}

/// Pattern of persisted facts for each state: presence, taint (`None`
/// matches both values) and whether a process is in flight.
const STATE_TABLE: [(Presence, Option<bool>, bool, State); 6] = [
    (Presence::SOURCE, None, false, State::Unshared),
    (Presence::SOURCE_OUTBOUND, None, true, State::Activated),
    (Presence::ALL, None, true, State::Received),
    (Presence::ALL, Some(false), false, State::Shared),
    (Presence::ALL, Some(true), false, State::Tainted),
    (Presence::SOURCE_OUTBOUND, Some(true), false, State::Deprecated),
];

impl State {
    /// All states.
    pub const ALL: [State; 6] = [
        State::Unshared,
        State::Activated,
        State::Received,
        State::Shared,
        State::Tainted,
        State::Deprecated,
    ];

    /// Looks up the state of `identifier` from its persisted facts.
    ///
    /// Returns `UnreachableState` if no state matches.
    pub fn from_persistent(
        identifier: &Identifier,
        persistent: PersistentState,
    ) -> CoreResult<Self> {
        STATE_TABLE
            .iter()
            .find(|(presence, tainted, has_process, _)| {
                *presence == persistent.presence
                    && *has_process == persistent.has_process
                    && tainted.map_or(true, |t| t == persistent.is_tainted)
            })
            .map(|(_, _, _, state)| *state)
            .ok_or_else(|| CoreError::UnreachableState {
                identifier: identifier.clone(),
                presence: persistent.presence,
                is_tainted: persistent.is_tainted,
                has_process: persistent.has_process,
            })
    }

    /// Returns the components a record in this state is present in.
    #[must_use]
    pub const fn presence(self) -> Presence {
        match self {
            State::Unshared => Presence::SOURCE,
            State::Activated | State::Deprecated => Presence::SOURCE_OUTBOUND,
            State::Received | State::Shared | State::Tainted => Presence::ALL,
        }
    }

    /// Returns true if no process can be in flight in this state.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, State::Activated | State::Received)
    }

    /// Returns the snake_case name of the state.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            State::Unshared => "unshared",
            State::Activated => "activated",
            State::Received => "received",
            State::Shared => "shared",
            State::Tainted => "tainted",
            State::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The persistence mutation required to realize one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Copy into outbound and record a pull process.
    StartPullProcess,
    /// Copy into local.
    AddToLocal,
    /// Remove from outbound and clear the delete process.
    FinishDeleteProcess,
    /// Clear the process of a tainted record, leaving it in source and outbound.
    Deprecate,
    /// Clear the pull process.
    FinishPullProcess,
    /// Remove from local.
    RemoveFromLocal,
    /// Record a delete process.
    StartDeleteProcess,
}

impl Command {
    /// Returns the snake_case name of the command.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Command::StartPullProcess => "start_pull_process",
            Command::AddToLocal => "add_to_local",
            Command::FinishDeleteProcess => "finish_delete_process",
            Command::Deprecate => "deprecate",
            Command::FinishPullProcess => "finish_pull_process",
            Command::RemoveFromLocal => "remove_from_local",
            Command::StartDeleteProcess => "start_delete_process",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Target of a valid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Target {
    pub state: State,
    pub process: Process,
    pub command: Command,
}

const fn target(state: State, process: Process, command: Command) -> Option<Target> {
    Some(Target {
        state,
        process,
        command,
    })
}

/// The transition table. Returns `None` for invalid operations.
pub(crate) const fn transition(
    state: State,
    process: Process,
    is_tainted: bool,
    operation: Operation,
) -> Option<Target> {
    use Command as C;
    match (state, operation, process, is_tainted) {
        (State::Unshared, Operation::StartPull, _, _) => {
            target(State::Activated, Process::Pull, C::StartPullProcess)
        }
        (State::Activated, Operation::Process, Process::Pull, false) => {
            target(State::Received, Process::Pull, C::AddToLocal)
        }
        (State::Activated, Operation::Process, Process::Pull, true) => {
            target(State::Deprecated, Process::None, C::Deprecate)
        }
        (State::Activated, Operation::Process, Process::Delete, false) => {
            target(State::Unshared, Process::None, C::FinishDeleteProcess)
        }
        (State::Activated, Operation::Process, Process::Delete, true) => {
            target(State::Deprecated, Process::None, C::Deprecate)
        }
        (State::Received, Operation::Process, Process::Pull, false) => {
            target(State::Shared, Process::None, C::FinishPullProcess)
        }
        (State::Received, Operation::Process, Process::Pull, true) => {
            target(State::Tainted, Process::None, C::FinishPullProcess)
        }
        (State::Received, Operation::Process, Process::Delete, _) => {
            target(State::Activated, Process::Delete, C::RemoveFromLocal)
        }
        (State::Shared | State::Tainted, Operation::StartDelete, _, _) => {
            target(State::Received, Process::Delete, C::StartDeleteProcess)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(presence: Presence, is_tainted: bool, has_process: bool) -> CoreResult<State> {
        State::from_persistent(
            &Identifier::from("1"),
            PersistentState::new(presence, is_tainted, has_process),
        )
    }

    #[test]
    fn presence_set_operations() {
        let presence: Presence = [Component::Source, Component::Outbound].into_iter().collect();
        assert_eq!(presence, Presence::SOURCE_OUTBOUND);
        assert!(presence.contains(Component::Outbound));
        assert!(!presence.contains(Component::Local));
        assert_eq!(presence.to_string(), "source+outbound");
        assert_eq!(Presence::NONE.to_string(), "none");
    }

    #[test]
    fn lookup_table() {
        let cases = [
            (Presence::SOURCE, false, false, State::Unshared),
            (Presence::SOURCE, true, false, State::Unshared),
            (Presence::SOURCE_OUTBOUND, false, true, State::Activated),
            (Presence::SOURCE_OUTBOUND, true, true, State::Activated),
            (Presence::ALL, true, true, State::Received),
            (Presence::ALL, false, false, State::Shared),
            (Presence::ALL, true, false, State::Tainted),
            (Presence::SOURCE_OUTBOUND, true, false, State::Deprecated),
        ];
        for (presence, is_tainted, has_process, state) in cases {
            assert_eq!(lookup(presence, is_tainted, has_process).unwrap(), state);
        }
    }

    #[test]
    fn unreachable_triples_are_rejected() {
        assert!(matches!(
            lookup(Presence::SOURCE_OUTBOUND, false, false),
            Err(CoreError::UnreachableState { .. })
        ));
        assert!(lookup(Presence::SOURCE, false, true).is_err());
        assert!(lookup(Presence::NONE, false, false).is_err());
        assert!(lookup(Presence::NONE.with(Component::Local), false, false).is_err());
    }

    #[test]
    fn presence_is_inverse_of_lookup() {
        for state in State::ALL {
            let has_process = !state.is_settled();
            let is_tainted = matches!(state, State::Tainted | State::Deprecated);
            assert_eq!(lookup(state.presence(), is_tainted, has_process).unwrap(), state);
        }
    }

    #[test]
    fn transition_table_entries() {
        let t = transition(State::Unshared, Process::None, false, Operation::StartPull).unwrap();
        assert_eq!(
            (t.state, t.process, t.command),
            (State::Activated, Process::Pull, Command::StartPullProcess)
        );

        let t = transition(State::Activated, Process::Pull, true, Operation::Process).unwrap();
        assert_eq!((t.state, t.command), (State::Deprecated, Command::Deprecate));

        let t = transition(State::Received, Process::Delete, true, Operation::Process).unwrap();
        assert_eq!(
            (t.state, t.process, t.command),
            (State::Activated, Process::Delete, Command::RemoveFromLocal)
        );

        let t = transition(State::Tainted, Process::None, true, Operation::StartDelete).unwrap();
        assert_eq!((t.state, t.command), (State::Received, Command::StartDeleteProcess));
    }

    #[test]
    fn settled_states_reject_process() {
        for state in [State::Unshared, State::Shared, State::Tainted, State::Deprecated] {
            for is_tainted in [false, true] {
                assert!(transition(state, Process::None, is_tainted, Operation::Process).is_none());
            }
        }
    }

    #[test]
    fn valid_transitions_change_state() {
        for state in State::ALL {
            for process in [Process::None, Process::Pull, Process::Delete] {
                for is_tainted in [false, true] {
                    for operation in Operation::ALL {
                        if let Some(t) = transition(state, process, is_tainted, operation) {
                            assert_ne!(t.state, state);
                            assert_eq!(t.process.is_active(), !t.state.is_settled());
                        }
                    }
                }
            }
        }
    }
}
