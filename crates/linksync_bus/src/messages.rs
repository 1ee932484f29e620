//! Commands and events carried by the bus.

use linksync_core::{Identifier, InvalidOperationRequested, Process, State, StateChanged};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A request handled by exactly one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusCommand {
    /// Pull a batch of identifiers.
    PullEntities {
        /// Identifiers to pull.
        requested: BTreeSet<Identifier>,
    },
    /// Delete a batch of identifiers from the local store.
    DeleteEntities {
        /// Identifiers to delete.
        requested: BTreeSet<Identifier>,
    },
    /// Pull one identifier.
    PullEntity {
        /// Identifier to pull.
        identifier: Identifier,
    },
    /// Delete one identifier from the local store.
    DeleteEntity {
        /// Identifier to delete.
        identifier: Identifier,
    },
    /// List identifiers present only in the source.
    ListIdleEntities,
}

impl BusCommand {
    /// Returns the kind used to route this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            BusCommand::PullEntities { .. } => CommandKind::PullEntities,
            BusCommand::DeleteEntities { .. } => CommandKind::DeleteEntities,
            BusCommand::PullEntity { .. } => CommandKind::PullEntity,
            BusCommand::DeleteEntity { .. } => CommandKind::DeleteEntity,
            BusCommand::ListIdleEntities => CommandKind::ListIdleEntities,
        }
    }
}

/// Routing key of a [`BusCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// [`BusCommand::PullEntities`]
    PullEntities,
    /// [`BusCommand::DeleteEntities`]
    DeleteEntities,
    /// [`BusCommand::PullEntity`]
    PullEntity,
    /// [`BusCommand::DeleteEntity`]
    DeleteEntity,
    /// [`BusCommand::ListIdleEntities`]
    ListIdleEntities,
}

impl CommandKind {
    /// All command kinds.
    pub const ALL: [CommandKind; 5] = [
        CommandKind::PullEntities,
        CommandKind::DeleteEntities,
        CommandKind::PullEntity,
        CommandKind::DeleteEntity,
        CommandKind::ListIdleEntities,
    ];

    /// Returns the snake_case name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            CommandKind::PullEntities => "pull_entities",
            CommandKind::DeleteEntities => "delete_entities",
            CommandKind::PullEntity => "pull_entity",
            CommandKind::DeleteEntity => "delete_entity",
            CommandKind::ListIdleEntities => "list_idle_entities",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How one entity's workflow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "result", content = "state", rename_all = "snake_case")]
pub enum EntityOutcome {
    /// The entity changed state and ended in the given state.
    Completed(State),
    /// The starting operation was rejected in the given state.
    Rejected(State),
}

impl EntityOutcome {
    /// Returns the state the entity was left in.
    pub fn state(self) -> State {
        match self {
            EntityOutcome::Completed(state) | EntityOutcome::Rejected(state) => state,
        }
    }

    /// Returns true if the starting operation was rejected.
    pub fn is_rejected(self) -> bool {
        matches!(self, EntityOutcome::Rejected(_))
    }
}

/// A notification observed by zero or more handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A committed state change.
    StateChanged(StateChanged),
    /// A rejected operation.
    InvalidOperationRequested(InvalidOperationRequested),
    /// A workflow started for one identifier.
    ProcessStarted {
        /// The workflow.
        process: Process,
        /// The identifier it runs for.
        identifier: Identifier,
    },
    /// A workflow finished for one identifier.
    ProcessFinished {
        /// The workflow.
        process: Process,
        /// The identifier it ran for.
        identifier: Identifier,
        /// How it ended.
        outcome: EntityOutcome,
    },
    /// A batch workflow started.
    BatchProcessingStarted {
        /// The workflow.
        process: Process,
        /// The requested identifiers.
        identifiers: BTreeSet<Identifier>,
    },
    /// A batch workflow finished, after all of its per-identifier work.
    BatchProcessingFinished {
        /// The workflow.
        process: Process,
        /// The requested identifiers.
        identifiers: BTreeSet<Identifier>,
    },
    /// Identifiers present only in the source.
    IdleEntitiesListed {
        /// The idle identifiers.
        identifiers: BTreeSet<Identifier>,
    },
}

impl Event {
    /// Returns the kind used to route this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StateChanged(_) => EventKind::StateChanged,
            Event::InvalidOperationRequested(_) => EventKind::InvalidOperationRequested,
            Event::ProcessStarted { .. } => EventKind::ProcessStarted,
            Event::ProcessFinished { .. } => EventKind::ProcessFinished,
            Event::BatchProcessingStarted { .. } => EventKind::BatchProcessingStarted,
            Event::BatchProcessingFinished { .. } => EventKind::BatchProcessingFinished,
            Event::IdleEntitiesListed { .. } => EventKind::IdleEntitiesListed,
        }
    }
}

/// Routing key of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// [`Event::StateChanged`]
    StateChanged,
    /// [`Event::InvalidOperationRequested`]
    InvalidOperationRequested,
    /// [`Event::ProcessStarted`]
    ProcessStarted,
    /// [`Event::ProcessFinished`]
    ProcessFinished,
    /// [`Event::BatchProcessingStarted`]
    BatchProcessingStarted,
    /// [`Event::BatchProcessingFinished`]
    BatchProcessingFinished,
    /// [`Event::IdleEntitiesListed`]
    IdleEntitiesListed,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [EventKind; 7] = [
        EventKind::StateChanged,
        EventKind::InvalidOperationRequested,
        EventKind::ProcessStarted,
        EventKind::ProcessFinished,
        EventKind::BatchProcessingStarted,
        EventKind::BatchProcessingFinished,
        EventKind::IdleEntitiesListed,
    ];

    /// Returns the snake_case name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::StateChanged => "state_changed",
            EventKind::InvalidOperationRequested => "invalid_operation_requested",
            EventKind::ProcessStarted => "process_started",
            EventKind::ProcessFinished => "process_finished",
            EventKind::BatchProcessingStarted => "batch_processing_started",
            EventKind::BatchProcessingFinished => "batch_processing_finished",
            EventKind::IdleEntitiesListed => "idle_entities_listed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything the bus can dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message", content = "body", rename_all = "snake_case")]
pub enum Message {
    /// A command.
    Command(BusCommand),
    /// An event.
    Event(Event),
}

impl Message {
    /// Returns the snake_case name of the message's kind.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(command) => command.kind().name(),
            Message::Event(event) => event.kind().name(),
        }
    }
}

impl From<BusCommand> for Message {
    fn from(command: BusCommand) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}
