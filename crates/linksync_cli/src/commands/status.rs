//! Status and idle commands.

use super::{open, CliResult};
use linksync_bus::list_idle_entities;
use linksync_core::{Identifier, LinkGateway, Process, State};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// One identifier in a status listing.
#[derive(Debug, Serialize)]
pub struct EntityStatus {
    /// The identifier.
    pub identifier: Identifier,
    /// Derived state.
    pub state: State,
    /// Process in flight.
    pub process: Process,
    /// Whether the source flags it as faulty.
    pub tainted: bool,
}

/// Every identifier of the link.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Entities in identifier order.
    pub entities: Vec<EntityStatus>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entities.is_empty() {
            return writeln!(f, "No identifiers");
        }
        writeln!(f, "{:<24} {:<12} {:<8} TAINTED", "IDENTIFIER", "STATE", "PROCESS")?;
        for entity in &self.entities {
            writeln!(
                f,
                "{:<24} {:<12} {:<8} {}",
                entity.identifier.as_ref(),
                entity.state.name(),
                entity.process.to_string(),
                if entity.tainted { "yes" } else { "no" }
            )?;
        }
        Ok(())
    }
}

/// Identifiers present only in the source.
#[derive(Debug, Serialize)]
pub struct IdleReport {
    /// The idle identifiers.
    pub identifiers: BTreeSet<Identifier>,
}

impl fmt::Display for IdleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in &self.identifiers {
            writeln!(f, "{id}")?;
        }
        Ok(())
    }
}

/// Runs the status command.
pub fn run(store: &Path) -> CliResult<StatusReport> {
    let link = open(store)?.create_link()?;
    let entities = link
        .entities()
        .map(|entity| EntityStatus {
            identifier: entity.identifier().clone(),
            state: entity.state(),
            process: entity.current_process(),
            tainted: entity.is_tainted(),
        })
        .collect();
    Ok(StatusReport { entities })
}

/// Runs the idle command.
pub fn idle(store: &Path) -> CliResult<IdleReport> {
    let gateway = open(store)?;
    Ok(IdleReport {
        identifiers: list_idle_entities(&gateway)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{batch, init, source};
    use tempfile::tempdir;

    #[test]
    fn status_lists_every_identifier() {
        let temp = tempdir().unwrap();
        init::run(temp.path()).unwrap();
        source::add(temp.path(), vec!["a".into(), "b".into()]).unwrap();
        batch::run(temp.path(), batch::Batch::Pull, vec!["b".into()]).unwrap();

        let report = run(temp.path()).unwrap();

        let states: Vec<(String, State)> = report
            .entities
            .iter()
            .map(|e| (e.identifier.to_string(), e.state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("a".to_string(), State::Unshared),
                ("b".to_string(), State::Shared),
            ]
        );
        assert!(report.to_string().starts_with("IDENTIFIER"));
    }

    #[test]
    fn empty_status() {
        let temp = tempdir().unwrap();
        init::run(temp.path()).unwrap();

        assert_eq!(run(temp.path()).unwrap().to_string(), "No identifiers\n");
    }

    #[test]
    fn idle_lists_source_only() {
        let temp = tempdir().unwrap();
        init::run(temp.path()).unwrap();
        source::add(temp.path(), vec!["x".into(), "y".into()]).unwrap();
        batch::run(temp.path(), batch::Batch::Pull, vec!["x".into()]).unwrap();

        let report = idle(temp.path()).unwrap();

        assert_eq!(report.to_string(), "y\n");
    }
}
