//! File-backed link gateway.

use crate::config::StoreConfig;
use crate::dir::StoreDir;
use crate::error::StoreResult;
use linksync_core::{CoreResult, Identifier, Link, LinkFacts, LinkGateway, StateChanged};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// A gateway persisting link facts as a JSON snapshot.
///
/// Every mutation is validated and written to disk before the in-memory copy
/// changes, so a rejected or failed write leaves both untouched.
#[derive(Debug)]
pub struct FileGateway {
    dir: StoreDir,
    facts: RwLock<LinkFacts>,
    pretty: bool,
}

impl FileGateway {
    /// Opens the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another gateway holds the store, `NotFound` if it
    /// is missing and `create_if_missing` is off, or `Core` if the snapshot
    /// describes an inconsistent link.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let dir = StoreDir::open(config.path(), config.create_if_missing)?;
        let facts = match dir.load()? {
            Some(facts) => facts,
            None => {
                let facts = LinkFacts::new();
                dir.save(&facts, config.pretty)?;
                facts
            }
        };
        Link::create(&facts)?;

        info!(
            path = %dir.path().display(),
            identifiers = facts.source.len(),
            "store opened"
        );
        Ok(Self {
            dir,
            facts: RwLock::new(facts),
            pretty: config.pretty,
        })
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a copy of the current facts.
    pub fn facts(&self) -> LinkFacts {
        self.facts.read().clone()
    }

    /// Registers identifiers in the source.
    pub fn add_to_source<I>(&self, identifiers: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = Identifier>,
    {
        self.mutate(|facts| facts.source.extend(identifiers))
    }

    /// Flags source identifiers as faulty.
    ///
    /// Returns the identifiers that were ignored because they are not in the
    /// source.
    pub fn taint<I>(&self, identifiers: I) -> StoreResult<BTreeSet<Identifier>>
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut unknown = BTreeSet::new();
        self.mutate(|facts| {
            for id in identifiers {
                if facts.source.contains(&id) {
                    facts.tainted.insert(id);
                } else {
                    unknown.insert(id);
                }
            }
        })?;
        Ok(unknown)
    }

    /// Clears the faulty flag of identifiers.
    ///
    /// Returns the deprecated identifiers, which keep their flag.
    pub fn untaint<I>(&self, identifiers: I) -> StoreResult<BTreeSet<Identifier>>
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut kept = BTreeSet::new();
        self.mutate(|facts| {
            kept = identifiers
                .into_iter()
                .filter(|id| !facts.untaint(id))
                .collect();
        })?;
        Ok(kept)
    }

    fn mutate(&self, change: impl FnOnce(&mut LinkFacts)) -> StoreResult<()> {
        let mut current = self.facts.write();
        let mut next = current.clone();
        change(&mut next);
        if next == *current {
            return Ok(());
        }
        Link::create(&next)?;
        self.dir.save(&next, self.pretty)?;
        *current = next;
        Ok(())
    }
}

impl LinkGateway for FileGateway {
    fn create_link(&self) -> CoreResult<Link> {
        Link::create(&self.facts.read())
    }

    fn apply(&self, updates: &[StateChanged]) -> CoreResult<()> {
        self.mutate(|facts| {
            for update in updates {
                debug!(
                    identifier = %update.identifier,
                    command = %update.command,
                    "applying update"
                );
                facts.apply_update(update);
            }
        })?;
        Ok(())
    }
}
