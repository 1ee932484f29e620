//! Handles that record state changes into their unit of work.

use crate::entity::{Entity, Identifier};
use crate::error::CoreResult;
use crate::events::{
    EntityOperationResult, InvalidOperationRequested, LinkStateChanged, StateChanged,
};
use crate::link::Link;
use crate::types::Operation;
use std::collections::{BTreeSet, VecDeque};
use std::ops::Deref;

/// Changes recorded within one unit of work.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    /// State changes awaiting commit, in recording order.
    pub(crate) events: VecDeque<StateChanged>,
    /// Rejected operations.
    pub(crate) rejections: Vec<InvalidOperationRequested>,
    /// Identifiers an operation was applied to.
    pub(crate) seen: BTreeSet<Identifier>,
}

impl Journal {
    fn record(&mut self, result: &EntityOperationResult) {
        match result {
            EntityOperationResult::Updated(update) => self.record_update(update),
            EntityOperationResult::Rejected(error) => self.record_rejection(error),
        }
    }

    fn record_update(&mut self, update: &StateChanged) {
        self.seen.insert(update.identifier.clone());
        if update.transition.is_change() {
            self.events.push_back(update.clone());
        }
    }

    fn record_rejection(&mut self, error: &InvalidOperationRequested) {
        self.seen.insert(error.identifier.clone());
        self.rejections.push(error.clone());
    }
}

/// The link of a unit of work.
///
/// Dereferences to [`Link`] for read access; mutations go through
/// [`TrackedLink::apply`] so they are recorded.
#[derive(Debug)]
pub struct TrackedLink<'u> {
    link: &'u mut Link,
    journal: &'u mut Journal,
}

impl<'u> TrackedLink<'u> {
    pub(crate) fn new(link: &'u mut Link, journal: &'u mut Journal) -> Self {
        Self { link, journal }
    }

    /// Applies `operation` to the requested entities and records the outcome.
    ///
    /// See [`Link::apply`] for preconditions.
    pub fn apply(
        &mut self,
        operation: Operation,
        requested: &BTreeSet<Identifier>,
    ) -> CoreResult<LinkStateChanged> {
        let result = self.link.apply(operation, requested)?;
        for update in &result.updates {
            self.journal.record_update(update);
        }
        for error in &result.errors {
            self.journal.record_rejection(error);
        }
        Ok(result)
    }

    /// Returns a tracked handle to one entity.
    pub fn entity(&mut self, identifier: &Identifier) -> Option<TrackedEntity<'_>> {
        let entity = self.link.entity_mut(identifier)?;
        Some(TrackedEntity {
            entity,
            journal: &mut *self.journal,
        })
    }
}

impl Deref for TrackedLink<'_> {
    type Target = Link;

    fn deref(&self) -> &Self::Target {
        self.link
    }
}

/// One entity of a unit of work.
#[derive(Debug)]
pub struct TrackedEntity<'u> {
    entity: &'u mut Entity,
    journal: &'u mut Journal,
}

impl TrackedEntity<'_> {
    /// Applies `operation` and records the outcome.
    pub fn apply(&mut self, operation: Operation) -> EntityOperationResult {
        let result = self.entity.apply(operation);
        self.journal.record(&result);
        result
    }
}

impl Deref for TrackedEntity<'_> {
    type Target = Entity;

    fn deref(&self) -> &Self::Target {
        self.entity
    }
}
