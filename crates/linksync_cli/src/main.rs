//! linksync CLI
//!
//! Command-line tools for a linksync file store.
//!
//! # Commands
//!
//! - `init` - Create an empty store
//! - `add` / `taint` / `untaint` - Change the source side
//! - `pull` / `delete` - Run a batch workflow
//! - `idle` - List identifiers only present in the source
//! - `status` - Show every identifier with its state

mod commands;

use clap::{Parser, Subcommand};
use commands::Format;
use linksync_core::Identifier;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Synchronize entities between a source and a local store.
#[derive(Parser)]
#[command(name = "linksync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long, default_value = "linksync")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store directory and an empty snapshot
    Init,

    /// Register identifiers in the source
    Add {
        /// Identifiers to add
        #[arg(required = true)]
        identifiers: Vec<Identifier>,
    },

    /// Flag source identifiers as faulty
    Taint {
        /// Identifiers to flag
        #[arg(required = true)]
        identifiers: Vec<Identifier>,
    },

    /// Clear the faulty flag
    Untaint {
        /// Identifiers to clear
        #[arg(required = true)]
        identifiers: Vec<Identifier>,
    },

    /// Pull identifiers into the local store
    Pull {
        /// Identifiers to pull
        #[arg(required = true)]
        identifiers: Vec<Identifier>,
    },

    /// Delete identifiers from the local store
    Delete {
        /// Identifiers to delete
        #[arg(required = true)]
        identifiers: Vec<Identifier>,
    },

    /// List identifiers present only in the source
    Idle,

    /// Show every identifier with its state and process
    Status,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = cli.store.as_path();
    let format = cli.format;
    match cli.command {
        Commands::Init => commands::print(&commands::init::run(store)?, format)?,
        Commands::Add { identifiers } => {
            commands::print(&commands::source::add(store, identifiers)?, format)?;
        }
        Commands::Taint { identifiers } => {
            commands::print(&commands::source::taint(store, identifiers)?, format)?;
        }
        Commands::Untaint { identifiers } => {
            commands::print(&commands::source::untaint(store, identifiers)?, format)?;
        }
        Commands::Pull { identifiers } => {
            let report = commands::batch::run(store, commands::batch::Batch::Pull, identifiers)?;
            commands::print(&report, format)?;
        }
        Commands::Delete { identifiers } => {
            let report = commands::batch::run(store, commands::batch::Batch::Delete, identifiers)?;
            commands::print(&report, format)?;
        }
        Commands::Idle => commands::print(&commands::status::idle(store)?, format)?,
        Commands::Status => commands::print(&commands::status::run(store)?, format)?,
    }

    Ok(())
}
