//! Init command implementation.

use super::CliResult;
use linksync_store::{FileGateway, StoreConfig};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Result of initializing a store.
#[derive(Debug, Serialize)]
pub struct InitReport {
    /// Store directory.
    pub path: String,
    /// Number of identifiers already in the source.
    pub source_count: usize,
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Store ready at {}", self.path)?;
        writeln!(f, "Source identifiers: {}", self.source_count)
    }
}

/// Runs the init command.
///
/// Opening an existing store leaves its snapshot untouched.
pub fn run(store: &Path) -> CliResult<InitReport> {
    let gateway = FileGateway::open(StoreConfig::new(store).with_create_if_missing(true))?;
    Ok(InitReport {
        path: gateway.path().display().to_string(),
        source_count: gateway.facts().source.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_store() {
        let temp = tempdir().unwrap();
        let store = temp.path().join("links");

        let report = run(&store).unwrap();

        assert_eq!(report.source_count, 0);
        assert!(store.join("link.json").exists());
        assert!(report.to_string().starts_with("Store ready at"));
    }

    #[test]
    fn init_is_idempotent() {
        let temp = tempdir().unwrap();
        run(temp.path()).unwrap();
        crate::commands::source::add(temp.path(), vec!["a".into()]).unwrap();

        assert_eq!(run(temp.path()).unwrap().source_count, 1);
    }
}
