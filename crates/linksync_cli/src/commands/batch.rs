//! Pull and delete commands.

use super::{open, CliResult};
use linksync_bus::{
    bootstrap, finished_outcome, BusCommand, BusResult, EntityOutcome, Event, EventKind, Outbox,
    ServiceConfig, Tally, TallyCounts,
};
use linksync_core::{Identifier, State};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// The batch workflow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Batch {
    /// Copy identifiers into the local store.
    Pull,
    /// Remove identifiers from the local store.
    Delete,
}

/// An identifier whose workflow could not start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// The rejected identifier.
    pub identifier: Identifier,
    /// Its state when the request was rejected.
    pub state: State,
}

/// Result of a batch workflow.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// The workflow that ran.
    pub batch: Batch,
    /// Outcome counts.
    pub counts: TallyCounts,
    /// Identifiers whose workflow was rejected.
    pub rejections: Vec<Rejection>,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "requested: {}, settled: {}, rejected: {}",
            self.counts.requested, self.counts.settled, self.counts.rejected
        )?;
        for rejection in &self.rejections {
            writeln!(f, "  rejected {} ({})", rejection.identifier, rejection.state)?;
        }
        Ok(())
    }
}

/// Runs a batch workflow over `identifiers`.
pub fn run(store: &Path, batch: Batch, identifiers: Vec<Identifier>) -> CliResult<BatchReport> {
    let gateway = Arc::new(open(store)?);
    let mut bus = bootstrap(gateway, ServiceConfig::default())?;
    let tally = Tally::new();
    tally.attach(&mut bus);

    let rejections = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&rejections);
    bus.subscribe(
        EventKind::ProcessFinished,
        move |event: &Event, _: &mut Outbox| -> BusResult<()> {
            if let Some((identifier, EntityOutcome::Rejected(state))) = finished_outcome(event) {
                sink.borrow_mut().push(Rejection {
                    identifier: identifier.clone(),
                    state,
                });
            }
            Ok(())
        },
    );

    let requested = identifiers.into_iter().collect();
    let command = match batch {
        Batch::Pull => BusCommand::PullEntities { requested },
        Batch::Delete => BusCommand::DeleteEntities { requested },
    };
    bus.handle(command)?;

    let rejections = rejections.take();
    Ok(BatchReport {
        batch,
        counts: tally.counts(),
        rejections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{init, source, status};
    use tempfile::tempdir;

    fn ids(tokens: &[&str]) -> Vec<Identifier> {
        tokens.iter().copied().map(Identifier::from).collect()
    }

    #[test]
    fn pull_reports_counts_and_rejections() {
        let temp = tempdir().unwrap();
        init::run(temp.path()).unwrap();
        source::add(temp.path(), ids(&["1", "2"])).unwrap();
        run(temp.path(), Batch::Pull, ids(&["1"])).unwrap();

        let report = run(temp.path(), Batch::Pull, ids(&["1", "2"])).unwrap();

        assert_eq!(report.counts.requested, 2);
        assert_eq!(report.counts.settled, 1);
        assert_eq!(report.counts.rejected, 1);
        assert_eq!(
            report.rejections,
            vec![Rejection {
                identifier: Identifier::from("1"),
                state: State::Shared,
            }]
        );
        assert!(report.to_string().contains("rejected 1 (shared)"));
    }

    #[test]
    fn delete_after_pull_empties_local() {
        let temp = tempdir().unwrap();
        init::run(temp.path()).unwrap();
        source::add(temp.path(), ids(&["a"])).unwrap();
        run(temp.path(), Batch::Pull, ids(&["a"])).unwrap();

        let report = run(temp.path(), Batch::Delete, ids(&["a"])).unwrap();

        assert_eq!(report.counts.settled, 1);
        assert!(report.rejections.is_empty());
        assert_eq!(
            status::idle(temp.path()).unwrap().identifiers,
            ids(&["a"]).into_iter().collect()
        );
    }

    #[test]
    fn unknown_identifier_fails_the_batch() {
        let temp = tempdir().unwrap();
        init::run(temp.path()).unwrap();

        assert!(run(temp.path(), Batch::Pull, ids(&["ghost"])).is_err());
    }

    #[test]
    fn report_serializes() {
        let report = BatchReport {
            batch: Batch::Delete,
            counts: TallyCounts::default(),
            rejections: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["batch"], "delete");
        assert_eq!(json["counts"]["settled"], 0);
    }
}
