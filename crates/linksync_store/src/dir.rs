//! Store directory management.
//!
//! ```text
//! <store>/
//! ├─ LOCK              # Advisory lock for single-writer
//! └─ link.json         # Snapshot of the link facts
//! ```
//!
//! The LOCK file ensures only one process can write to the store at a time.

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use linksync_core::LinkFacts;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_FILE: &str = "LOCK";
const SNAPSHOT_FILE: &str = "link.json";
/// Temporary file for atomic snapshot writes.
const SNAPSHOT_TEMP: &str = "link.json.tmp";

/// Snapshot format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    facts: &'a LinkFacts,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    facts: LinkFacts,
}

/// A locked store directory.
///
/// Only one `StoreDir` can exist per directory at a time.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a store directory and takes its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `Locked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> StoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StoreError::NotFound {
                    path: path.to_path_buf(),
                });
            }
        }

        if !path.is_dir() {
            return Err(StoreError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "store locked");

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.path.join(SNAPSHOT_FILE)
    }

    /// Loads the snapshot.
    ///
    /// Returns `None` if no snapshot has been written yet.
    pub fn load(&self) -> StoreResult<Option<LinkFacts>> {
        let snapshot_path = self.snapshot_path();
        if !snapshot_path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&snapshot_path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(Some(snapshot.facts))
    }

    /// Saves the snapshot atomically.
    ///
    /// Writes a temporary file, syncs it, then renames it over the snapshot.
    /// A failed write leaves the previous snapshot in place.
    pub fn save(&self, facts: &LinkFacts, pretty: bool) -> StoreResult<()> {
        let temp_path = self.path.join(SNAPSHOT_TEMP);
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            facts,
        };
        let data = if pretty {
            serde_json::to_vec_pretty(&snapshot)?
        } else {
            serde_json::to_vec(&snapshot)?
        };

        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.snapshot_path())?;
        self.sync_directory()?;

        debug!(bytes = data.len(), "snapshot saved");
        Ok(())
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StoreResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linksync_core::Identifier;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("store");

        let dir = StoreDir::open(&path, true).unwrap();

        assert!(path.is_dir());
        assert!(path.join(LOCK_FILE).exists());
        assert_eq!(dir.load().unwrap(), None);
    }

    #[test]
    fn open_missing_without_create_fails() {
        let temp = tempdir().unwrap();
        let err = StoreDir::open(&temp.path().join("absent"), false).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn open_file_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("plain");
        fs::write(&path, b"x").unwrap();

        let err = StoreDir::open(&path, true).unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory { .. }));
    }

    #[test]
    fn second_open_is_locked() {
        let temp = tempdir().unwrap();
        let _first = StoreDir::open(temp.path(), true).unwrap();

        let err = StoreDir::open(temp.path(), true).unwrap_err();
        assert!(matches!(err, StoreError::Locked { .. }));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        drop(StoreDir::open(temp.path(), true).unwrap());
        assert!(StoreDir::open(temp.path(), true).is_ok());
    }

    #[test]
    fn save_then_load() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();
        let mut facts = LinkFacts::new();
        facts.source.insert(Identifier::from("a"));

        dir.save(&facts, false).unwrap();

        assert_eq!(dir.load().unwrap(), Some(facts));
        assert!(!temp.path().join(SNAPSHOT_TEMP).exists());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();
        fs::write(dir.snapshot_path(), br#"{"version": 7, "facts": {}}"#).unwrap();

        let err = dir.load().unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedVersion {
                found: 7,
                expected: SNAPSHOT_VERSION
            }
        ));
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();
        fs::write(dir.snapshot_path(), b"{not json").unwrap();

        assert!(matches!(dir.load().unwrap_err(), StoreError::Json(_)));
    }
}
