//! Event listener counting workflow outcomes.

use crate::bus::{MessageBus, Outbox};
use crate::error::BusResult;
use crate::handlers::finished_outcome;
use crate::messages::{EntityOutcome, Event, EventKind};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Counts gathered by a [`Tally`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TallyCounts {
    /// Batch workflows started.
    pub batches: usize,
    /// Per-identifier workflows started.
    pub requested: usize,
    /// Workflows that completed in a settled state.
    pub settled: usize,
    /// Workflows whose starting operation was rejected.
    pub rejected: usize,
}

/// A shareable listener that counts requested, settled and rejected
/// identifiers.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    counts: Arc<Mutex<TallyCounts>>,
}

impl Tally {
    /// Creates a tally with zero counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes this tally to the events it counts.
    pub fn attach(&self, bus: &mut MessageBus) {
        for kind in [
            EventKind::BatchProcessingStarted,
            EventKind::ProcessStarted,
            EventKind::ProcessFinished,
        ] {
            let tally = self.clone();
            bus.subscribe(kind, move |event: &Event, _: &mut Outbox| -> BusResult<()> {
                tally.observe(event);
                Ok(())
            });
        }
    }

    /// Returns a snapshot of the counts.
    pub fn counts(&self) -> TallyCounts {
        *self.counts.lock()
    }

    /// Resets every count to zero.
    pub fn reset(&self) {
        *self.counts.lock() = TallyCounts::default();
    }

    /// Updates the counts for one event.
    pub fn observe(&self, event: &Event) {
        let mut counts = self.counts.lock();
        match event {
            Event::BatchProcessingStarted { .. } => counts.batches += 1,
            Event::ProcessStarted { .. } => counts.requested += 1,
            _ => match finished_outcome(event) {
                Some((_, EntityOutcome::Rejected(_))) => counts.rejected += 1,
                Some((_, EntityOutcome::Completed(state))) if state.is_settled() => {
                    counts.settled += 1;
                }
                _ => {}
            },
        }
    }
}
