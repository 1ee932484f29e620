//! Configuration for the file store.

use std::path::{Path, PathBuf};

/// Configuration for opening a file store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// The store directory.
    pub path: PathBuf,
    /// Whether to create the directory and an empty snapshot if missing.
    pub create_if_missing: bool,
    /// Whether the snapshot is written as indented JSON.
    pub pretty: bool,
}

impl StoreConfig {
    /// Creates a configuration for the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: false,
            pretty: true,
        }
    }

    /// Sets whether a missing store is created.
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets whether the snapshot is indented.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("linksync")
    }
}
