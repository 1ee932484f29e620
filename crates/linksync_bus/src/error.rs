//! Error types for the message bus and services.

use crate::messages::CommandKind;
use linksync_core::{CoreError, Process};
use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors that can occur while dispatching messages.
#[derive(Error, Debug)]
pub enum BusError {
    /// Error raised by the core model or a gateway.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A command was dispatched with no handler registered for its kind.
    #[error("no handler registered for command {kind}")]
    UnhandledCommand {
        /// Kind of the dispatched command.
        kind: CommandKind,
    },

    /// A second handler was registered for a command kind.
    #[error("a handler is already registered for command {kind}")]
    DuplicateHandler {
        /// Kind of the command.
        kind: CommandKind,
    },

    /// A handler failed for a reason of its own.
    #[error("handler failed: {0}")]
    Handler(String),

    /// Processing kept producing updates past the configured round limit.
    #[error("{process} process did not settle within {rounds} rounds")]
    ProcessDidNotSettle {
        /// The process being driven.
        process: Process,
        /// Rounds executed before giving up.
        rounds: usize,
    },
}

impl BusError {
    /// Creates a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Returns true if this error indicates a programming or modeling error
    /// rather than a transient failure.
    pub fn is_fatal(&self) -> bool {
        match self {
            BusError::Core(e) => e.is_fatal(),
            BusError::Handler(_) => false,
            BusError::UnhandledCommand { .. }
            | BusError::DuplicateHandler { .. }
            | BusError::ProcessDidNotSettle { .. } => true,
        }
    }
}
