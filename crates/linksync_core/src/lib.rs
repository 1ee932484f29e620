//! # linksync Core
//!
//! Replication lifecycle of records linked across three stores.
//!
//! This crate provides:
//! - The entity state machine (unshared → activated → received → shared)
//! - The [`Link`] aggregate over all identifiers known to the source
//! - The [`LinkGateway`] persistence boundary and an in-memory gateway
//! - A [`UnitOfWork`] that records state changes and commits them at once
//!
//! ## Components
//!
//! A record lives in up to three components: the authoritative *source*, the
//! *outbound* ledger and the *local* replica. Containment always holds:
//! `local ⊆ outbound ⊆ source`.
//!
//! ## Key Invariants
//!
//! - Every requested operation either updates an entity or is rejected
//! - Rejections are values, never errors
//! - Pull and delete processes never overlap for one identifier
//! - Nothing is persisted outside a committed unit of work

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod events;
mod facts;
mod gateway;
mod link;
mod state;
mod types;
mod unit_of_work;

pub use entity::{Entity, Identifier};
pub use error::{CoreError, CoreResult};
pub use events::{
    EntityOperationResult, InvalidOperationRequested, LinkStateChanged, StateChanged, Transition,
};
pub use facts::LinkFacts;
pub use gateway::{LinkGateway, MemoryGateway};
pub use link::Link;
pub use state::{Command, PersistentState, Presence, State};
pub use types::{Component, Operation, Process};
pub use unit_of_work::{CommitSummary, TrackedEntity, TrackedLink, UnitOfWork};
