//! Test fixtures and gateway helpers.
//!
//! Provides builders for link facts, gateways that fail on demand and
//! temporary store directories.

use linksync_core::{
    Component, CoreError, CoreResult, Identifier, Link, LinkFacts, LinkGateway, MemoryGateway,
    Process, State, StateChanged,
};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tempfile::TempDir;

/// Builds a set of identifiers from string tokens.
pub fn ids(tokens: &[&str]) -> BTreeSet<Identifier> {
    tokens.iter().copied().map(Identifier::from).collect()
}

/// Builder placing identifiers into the facts of a given state.
#[derive(Debug, Clone, Default)]
pub struct FactsBuilder {
    facts: LinkFacts,
}

impl FactsBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identifier in `state` with `process` in flight.
    ///
    /// The caller is responsible for passing a reachable combination.
    pub fn entity(
        mut self,
        identifier: impl Into<Identifier>,
        state: State,
        process: Process,
        is_tainted: bool,
    ) -> Self {
        let id = identifier.into();
        for component in state.presence().components() {
            let set = match component {
                Component::Source => &mut self.facts.source,
                Component::Outbound => &mut self.facts.outbound,
                Component::Local => &mut self.facts.local,
            };
            set.insert(id.clone());
        }
        if is_tainted {
            self.facts.tainted.insert(id.clone());
        }
        match process {
            Process::Pull => {
                self.facts.pull.insert(id);
            }
            Process::Delete => {
                self.facts.delete.insert(id);
            }
            Process::None => {}
        }
        self
    }

    /// Adds an identifier present only in the source.
    pub fn unshared(self, identifier: &str) -> Self {
        self.entity(identifier, State::Unshared, Process::None, false)
    }

    /// Adds an identifier in every component.
    pub fn shared(self, identifier: &str) -> Self {
        self.entity(identifier, State::Shared, Process::None, false)
    }

    /// Adds a tainted identifier in every component.
    pub fn tainted(self, identifier: &str) -> Self {
        self.entity(identifier, State::Tainted, Process::None, true)
    }

    /// Adds an identifier with a pull started but nothing copied locally.
    pub fn pulling(self, identifier: &str) -> Self {
        self.entity(identifier, State::Activated, Process::Pull, false)
    }

    /// Adds an identifier with a delete started.
    pub fn deleting(self, identifier: &str) -> Self {
        self.entity(identifier, State::Received, Process::Delete, false)
    }

    /// Returns the facts.
    pub fn build(self) -> LinkFacts {
        self.facts
    }

    /// Returns an in-memory gateway holding the facts.
    pub fn gateway(self) -> MemoryGateway {
        MemoryGateway::with_facts(self.facts)
    }
}

/// Parses facts from JSON.
///
/// # Panics
///
/// Panics if `json` is not valid facts.
pub fn facts_from_json(json: &str) -> LinkFacts {
    serde_json::from_str(json).expect("Invalid facts JSON")
}

/// A gateway that fails every `apply` after a number of successful calls.
#[derive(Debug)]
pub struct FlakyGateway {
    inner: MemoryGateway,
    remaining: Mutex<Option<usize>>,
}

impl FlakyGateway {
    /// Wraps `inner`; `apply` succeeds `successes` times, then fails.
    pub fn new(inner: MemoryGateway, successes: usize) -> Self {
        Self {
            inner,
            remaining: Mutex::new(Some(successes)),
        }
    }

    /// Wraps `inner` without ever failing.
    pub fn reliable(inner: MemoryGateway) -> Self {
        Self {
            inner,
            remaining: Mutex::new(None),
        }
    }

    /// Returns the wrapped gateway.
    pub fn inner(&self) -> &MemoryGateway {
        &self.inner
    }

    /// Makes every following `apply` fail.
    pub fn break_now(&self) {
        *self.remaining.lock() = Some(0);
    }
}

impl LinkGateway for FlakyGateway {
    fn create_link(&self) -> CoreResult<Link> {
        self.inner.create_link()
    }

    fn apply(&self, updates: &[StateChanged]) -> CoreResult<()> {
        {
            let mut remaining = self.remaining.lock();
            match remaining.as_mut() {
                Some(0) => return Err(CoreError::gateway("injected gateway failure")),
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.inner.apply(updates)
    }
}

/// A temporary directory for file store tests.
///
/// The directory is removed when the value is dropped.
pub struct TempStoreDir {
    dir: TempDir,
}

impl TempStoreDir {
    /// Creates a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns a path inside the directory where a store can be created.
    pub fn store_path(&self) -> std::path::PathBuf {
        self.dir.path().join("store")
    }

    /// Returns the root of the temporary directory.
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Default for TempStoreDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Ready-made link layouts.
pub mod scenarios {
    use super::*;

    /// One identifier in every reachable state, named after the state.
    pub fn one_of_each() -> FactsBuilder {
        FactsBuilder::new()
            .unshared("unshared")
            .pulling("activated")
            .entity("received", State::Received, Process::Pull, false)
            .shared("shared")
            .tainted("tainted")
            .entity("deprecated", State::Deprecated, Process::None, true)
    }

    /// `count` identifiers present only in the source, named `e0`, `e1`, ...
    pub fn unshared_source(count: usize) -> FactsBuilder {
        (0..count).fold(FactsBuilder::new(), |builder, i| {
            builder.entity(format!("e{i}"), State::Unshared, Process::None, false)
        })
    }
}
