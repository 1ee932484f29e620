//! Source-side commands: add, taint and untaint.

use super::{open, CliResult};
use linksync_core::Identifier;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Result of a source-side change.
#[derive(Debug, Serialize)]
pub struct SourceReport {
    /// What was done.
    pub action: &'static str,
    /// Identifiers the change applied to.
    pub applied: BTreeSet<Identifier>,
    /// Identifiers skipped because they are not in the source.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub unknown: BTreeSet<Identifier>,
    /// Deprecated identifiers that keep their faulty flag.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub kept: BTreeSet<Identifier>,
}

impl fmt::Display for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.action, self.applied.len())?;
        for id in &self.unknown {
            writeln!(f, "  not in source: {id}")?;
        }
        for id in &self.kept {
            writeln!(f, "  still tainted (deprecated): {id}")?;
        }
        Ok(())
    }
}

/// Registers identifiers in the source.
pub fn add(store: &Path, identifiers: Vec<Identifier>) -> CliResult<SourceReport> {
    let gateway = open(store)?;
    let applied: BTreeSet<Identifier> = identifiers.into_iter().collect();
    gateway.add_to_source(applied.iter().cloned())?;
    Ok(SourceReport {
        action: "added",
        applied,
        unknown: BTreeSet::new(),
        kept: BTreeSet::new(),
    })
}

/// Flags source identifiers as faulty.
pub fn taint(store: &Path, identifiers: Vec<Identifier>) -> CliResult<SourceReport> {
    let gateway = open(store)?;
    let requested: BTreeSet<Identifier> = identifiers.into_iter().collect();
    let unknown = gateway.taint(requested.iter().cloned())?;
    if !unknown.is_empty() {
        warn!(count = unknown.len(), "ignored identifiers not in source");
    }
    Ok(SourceReport {
        action: "tainted",
        applied: requested.difference(&unknown).cloned().collect(),
        unknown,
        kept: BTreeSet::new(),
    })
}

/// Clears the faulty flag.
pub fn untaint(store: &Path, identifiers: Vec<Identifier>) -> CliResult<SourceReport> {
    let gateway = open(store)?;
    let requested: BTreeSet<Identifier> = identifiers.into_iter().collect();
    let tainted = gateway.facts().tainted;
    let kept = gateway.untaint(requested.iter().cloned())?;
    if !kept.is_empty() {
        warn!(count = kept.len(), "deprecated identifiers keep their taint");
    }
    Ok(SourceReport {
        action: "untainted",
        applied: requested
            .intersection(&tainted)
            .filter(|id| !kept.contains(*id))
            .cloned()
            .collect(),
        unknown: BTreeSet::new(),
        kept,
    })
}
