//! Unit of work: a transactional scope around one gateway.
//!
//! A unit of work:
//! - Loads the [`Link`](crate::Link) from its gateway on first access
//! - Records every state change made through its handles, in order
//! - Flushes the recorded changes to the gateway on [`commit`](UnitOfWork::commit)
//! - Discards them on [`rollback`](UnitOfWork::rollback) or when dropped
//!
//! ## Expiry
//!
//! Handles ([`TrackedLink`], [`TrackedEntity`]) borrow the unit of work, and
//! `commit`/`rollback` consume it. Once a scope concludes, its handles can no
//! longer be used:
//!
//! ```compile_fail
//! use linksync_core::{MemoryGateway, Operation, UnitOfWork};
//! use std::collections::BTreeSet;
//!
//! let gateway = MemoryGateway::new();
//! let mut uow = UnitOfWork::begin(&gateway);
//! let mut link = uow.link().unwrap();
//! uow.commit().unwrap();
//! link.apply(Operation::Process, &BTreeSet::new()).unwrap();
//! ```

mod scope;
mod tracked;

pub use scope::{CommitSummary, UnitOfWork};
pub use tracked::{TrackedEntity, TrackedLink};
