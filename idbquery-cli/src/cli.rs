//! Manages the CLI argument parsing and logging configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A declarative query evaluator, runnable standalone against a JSON schema
/// file and a JSON-lines record dump.
#[derive(Parser)]
#[command(name = "idbquery", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Suppresses informational logging; errors still print.
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Loads a schema and a data file, then evaluates one query against it.
    Query(QueryArgs),
}

#[derive(clap::Args)]
pub struct QueryArgs {
    /// Path to a JSON schema file describing the stores and indexes.
    #[arg(long)]
    pub schema: PathBuf,

    /// Path to a newline-delimited JSON file of records to load.
    #[arg(long)]
    pub data: PathBuf,

    /// The store (as declared in the schema file) to query.
    #[arg(long)]
    pub store: String,

    /// The URL-encoded query string, e.g. `pk$prefix=a&$limit=10`.
    pub query: String,
}

/// The logging configuration derived from CLI flags, following the same
/// quiet/verbose shape the `LogConfig` in this project's inspiration used,
/// adapted to configure a `tracing` subscriber instead of hand-rolled
/// println-based logging.
pub struct LogConfig {
    pub quiet: bool,
}

impl LogConfig {
    pub fn init(&self) {
        let default_directive = if self.quiet { "warn" } else { "info" };

        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(default_directive.parse().expect("valid filter directive")),
            )
            .init();
    }
}
