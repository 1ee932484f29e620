//! Error types for linksync core.

use crate::entity::Identifier;
use crate::state::Presence;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in linksync core operations.
///
/// Rejected operations are not errors: applying an operation a state does
/// not define yields an [`InvalidOperationRequested`](crate::InvalidOperationRequested)
/// record instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller broke the contract of an operation (empty or unknown request).
    #[error("precondition violated: {message}")]
    PreconditionViolated {
        /// Description of the violated precondition.
        message: String,
    },

    /// Persisted facts break a containment or disjointness invariant.
    #[error("invariant violated: {message}")]
    InvariantViolated {
        /// Description of the violated invariant.
        message: String,
    },

    /// Persisted facts describe a combination no state maps to.
    #[error(
        "unreachable persistent state for {identifier}: presence {presence}, tainted {is_tainted}, process {has_process}"
    )]
    UnreachableState {
        /// The identifier whose facts are inconsistent.
        identifier: Identifier,
        /// Components holding the identifier.
        presence: Presence,
        /// Whether the source flagged the identifier.
        is_tainted: bool,
        /// Whether a process is recorded for the identifier.
        has_process: bool,
    },

    /// The gateway failed to read or persist facts.
    #[error("gateway error: {message}")]
    Gateway {
        /// Error message reported by the gateway.
        message: String,
    },
}

impl CoreError {
    /// Creates a precondition violation.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolated {
            message: message.into(),
        }
    }

    /// Creates an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolated {
            message: message.into(),
        }
    }

    /// Creates a gateway error.
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    /// Returns true if this error reports a programming or modeling error.
    ///
    /// Fatal errors are never retried or recovered automatically.
    pub fn is_fatal(&self) -> bool {
        match self {
            CoreError::PreconditionViolated { .. }
            | CoreError::InvariantViolated { .. }
            | CoreError::UnreachableState { .. } => true,
            CoreError::Gateway { .. } => false,
        }
    }
}
