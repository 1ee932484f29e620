//! # linksync Store
//!
//! A file-backed [`LinkGateway`](linksync_core::LinkGateway).
//!
//! The store is a directory holding an advisory `LOCK` file and a JSON
//! snapshot of the link facts. Opening a store takes the lock, so at most
//! one [`FileGateway`] writes to a directory at a time. Every mutation is
//! written to a temporary file and renamed over the snapshot.
//!
//! ```no_run
//! use linksync_store::{FileGateway, StoreConfig};
//!
//! let config = StoreConfig::new("links").with_create_if_missing(true);
//! let gateway = FileGateway::open(config)?;
//! gateway.add_to_source(["a".into(), "b".into()])?;
//! # Ok::<(), linksync_store::StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
mod gateway;

pub use config::StoreConfig;
pub use dir::{StoreDir, SNAPSHOT_VERSION};
pub use error::{StoreError, StoreResult};
pub use gateway::FileGateway;
