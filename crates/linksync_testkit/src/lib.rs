//! # linksync Testkit
//!
//! Test utilities for linksync.
//!
//! This crate provides:
//! - Fact builders and ready-made link layouts
//! - Gateways that fail on demand
//! - Temporary store directories
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use linksync_testkit::prelude::*;
//!
//! #[test]
//! fn pull_settles() {
//!     let gateway = FactsBuilder::new().unshared("1").gateway();
//!     // ... drive a workflow
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
