//! CLI command implementations.
//!
//! Every command returns a report that renders as text or JSON.

pub mod batch;
pub mod init;
pub mod source;
pub mod status;

use clap::ValueEnum;
use linksync_store::{FileGateway, StoreConfig};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Result type shared by the commands.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// How reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable lines.
    Text,
    /// A single JSON document.
    Json,
}

/// Prints a report in `format`.
pub fn print<R>(report: &R, format: Format) -> CliResult<()>
where
    R: Serialize + fmt::Display,
{
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
        Format::Text => print!("{report}"),
    }
    Ok(())
}

/// Opens an existing store.
fn open(store: &Path) -> CliResult<FileGateway> {
    Ok(FileGateway::open(StoreConfig::new(store))?)
}
