//! Error types for the file store.

use linksync_core::CoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the file store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error from the underlying file system.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot describes an inconsistent link.
    #[error("invalid snapshot: {0}")]
    Core(#[from] CoreError),

    /// Another process holds the store lock.
    #[error("store is locked by another process: {}", path.display())]
    Locked {
        /// The store directory.
        path: PathBuf,
    },

    /// The store directory does not exist.
    #[error("store does not exist: {}", path.display())]
    NotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// The store path exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The snapshot was written by an incompatible version.
    #[error("unsupported snapshot version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version found on disk.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Core(e) => e,
            other => CoreError::gateway(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_gateway_error() {
        let err = StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk full"));
        let core: CoreError = err.into();

        assert!(matches!(core, CoreError::Gateway { .. }));
        assert!(core.to_string().contains("disk full"));
    }

    #[test]
    fn core_errors_pass_through() {
        let err = StoreError::Core(CoreError::invariant("local without outbound"));
        assert!(matches!(CoreError::from(err), CoreError::InvariantViolated { .. }));
    }

    #[test]
    fn error_display() {
        let err = StoreError::Locked {
            path: PathBuf::from("/tmp/links"),
        };
        assert!(err.to_string().contains("/tmp/links"));

        let err = StoreError::UnsupportedVersion {
            found: 9,
            expected: 1,
        };
        assert_eq!(err.to_string(), "unsupported snapshot version 9, expected 1");
    }
}
