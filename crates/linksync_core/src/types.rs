//! Core type definitions for linksync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three replicated stores that may hold a copy of a record.
///
/// Components are ordered: records flow from `Source` through `Outbound`
/// into `Local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// The authoritative store.
    Source,
    /// The intermediate ledger between source and local.
    Outbound,
    /// The local replica.
    Local,
}

impl Component {
    /// All components in replication order.
    pub const ALL: [Component; 3] = [Component::Source, Component::Outbound, Component::Local];

    /// Returns the lowercase name of the component.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Component::Source => "source",
            Component::Outbound => "outbound",
            Component::Local => "local",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A multi-step workflow in flight for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    /// No workflow is in flight.
    #[default]
    None,
    /// The record is being copied into the local store.
    Pull,
    /// The record is being removed from the local store.
    Delete,
}

impl Process {
    /// Returns true if a workflow is in flight.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Process::None)
    }

    /// Returns the lowercase name of the process.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Process::None => "none",
            Process::Pull => "pull",
            Process::Delete => "delete",
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A high-level operation requested for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Start pulling the record into the local store.
    StartPull,
    /// Start removing the record from the local store.
    StartDelete,
    /// Advance the in-flight process by one step.
    Process,
}

impl Operation {
    /// All operations.
    pub const ALL: [Operation; 3] = [
        Operation::StartPull,
        Operation::StartDelete,
        Operation::Process,
    ];

    /// Returns the snake_case name of the operation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operation::StartPull => "start_pull",
            Operation::StartDelete => "start_delete",
            Operation::Process => "process",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
