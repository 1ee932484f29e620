//! Unit of work scope.

use super::tracked::{Journal, TrackedLink};
use crate::entity::Identifier;
use crate::error::CoreResult;
use crate::events::{InvalidOperationRequested, StateChanged};
use crate::gateway::LinkGateway;
use crate::link::Link;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What a committed unit of work flushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// State changes handed to the gateway, in recording order.
    pub updates: Vec<StateChanged>,
    /// Operations rejected within the scope.
    pub rejections: Vec<InvalidOperationRequested>,
    /// Identifiers an operation was applied to.
    pub seen: BTreeSet<Identifier>,
}

/// A transactional scope around one gateway.
///
/// Only state changes made through the handles returned by
/// [`UnitOfWork::link`] are recorded. Nothing reaches the gateway before
/// [`UnitOfWork::commit`].
///
/// # Example
///
/// ```rust,ignore
/// let mut uow = UnitOfWork::begin(&gateway);
/// uow.link()?.apply(Operation::StartPull, &requested)?;
/// let summary = uow.commit()?;
/// ```
pub struct UnitOfWork<'g, G: LinkGateway + ?Sized> {
    gateway: &'g G,
    link: Option<Link>,
    journal: Journal,
    concluded: bool,
}

impl<'g, G: LinkGateway + ?Sized> UnitOfWork<'g, G> {
    /// Opens a unit of work over `gateway`.
    pub fn begin(gateway: &'g G) -> Self {
        debug!("unit of work opened");
        Self {
            gateway,
            link: None,
            journal: Journal::default(),
            concluded: false,
        }
    }

    /// Returns the tracked link, loading it from the gateway on first use.
    pub fn link(&mut self) -> CoreResult<TrackedLink<'_>> {
        let link = match &mut self.link {
            Some(link) => link,
            slot @ None => slot.insert(self.gateway.create_link()?),
        };
        Ok(TrackedLink::new(link, &mut self.journal))
    }

    /// Returns the number of state changes awaiting commit.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.journal.events.len()
    }

    /// Returns the identifiers an operation was applied to so far.
    #[must_use]
    pub fn seen(&self) -> &BTreeSet<Identifier> {
        &self.journal.seen
    }

    /// Flushes the recorded state changes to the gateway.
    ///
    /// The unit of work is consumed whether or not the gateway succeeds.
    ///
    /// # Errors
    ///
    /// Returns the gateway's error. Updates flushed before the failing one
    /// may already be durable.
    pub fn commit(mut self) -> CoreResult<CommitSummary> {
        self.concluded = true;
        let journal = std::mem::take(&mut self.journal);
        let updates: Vec<StateChanged> = journal.events.into_iter().collect();

        if !updates.is_empty() {
            if let Err(e) = self.gateway.apply(&updates) {
                warn!(error = %e, updates = updates.len(), "unit of work commit failed");
                return Err(e);
            }
        }

        info!(
            updates = updates.len(),
            rejections = journal.rejections.len(),
            "unit of work committed"
        );

        Ok(CommitSummary {
            updates,
            rejections: journal.rejections,
            seen: journal.seen,
        })
    }

    /// Discards the recorded state changes.
    pub fn rollback(mut self) {
        self.concluded = true;
        debug!(discarded = self.journal.events.len(), "unit of work rolled back");
    }
}

impl<G: LinkGateway + ?Sized> Drop for UnitOfWork<'_, G> {
    fn drop(&mut self) {
        if !self.concluded && !self.journal.events.is_empty() {
            debug!(
                discarded = self.journal.events.len(),
                "unit of work dropped without commit"
            );
        }
    }
}
