//! # linksync Bus
//!
//! Workflows on top of `linksync_core`.
//!
//! This crate provides:
//! - A synchronous [`MessageBus`] for commands and events
//! - Services that drive pull and delete workflows to completion
//! - Command handlers wired by [`bootstrap`]
//! - A [`Tally`] listener for batch summaries
//!
//! ## Architecture
//!
//! A caller hands a [`BusCommand`] to the bus. Its handler opens a unit of
//! work, applies operations to the link and commits. The committed state
//! changes and the workflow's start and finish are published as [`Event`]s
//! for listeners.
//!
//! ## Key Invariants
//!
//! - Every command kind has exactly one handler
//! - Event handler failures never stop dispatch
//! - A batch's per-identifier work is fully handled before its completion
//!   event
//! - After a pull returns, no requested identifier is left mid-transfer

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bus;
mod config;
mod error;
mod handlers;
mod messages;
mod services;
mod tally;

pub use bus::{CommandHandler, EventHandler, MessageBus, Outbox};
pub use config::ServiceConfig;
pub use error::{BusError, BusResult};
pub use handlers::{bootstrap, finished_outcome, LinkHandlers};
pub use messages::{BusCommand, CommandKind, EntityOutcome, Event, EventKind, Message};
pub use services::{
    delete, list_idle_entities, process_to_completion, pull, ProcessOutcome, ProcessResponse,
};
pub use tally::{Tally, TallyCounts};
