mod cli;
mod config;

use cli::{Cli, Command, LogConfig};

use clap::Parser;
use idbquery::{query, Key, MemoryStore, Params, QueryResult};
use serde_json::Value;
use std::io::{BufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    LogConfig { quiet: cli.quiet }.init();

    let result = match cli.command {
        Command::Query(args) => run_query(args).await,
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run_query(args: cli::QueryArgs) -> anyhow::Result<()> {
    let schema = config::load_schema(&args.schema)?;
    let store_schema = schema.store(&args.store)?.clone();

    info!(store = %args.store, "loading records");
    let store = MemoryStore::new(store_schema);
    load_records(&store, &args.data)?;

    let cancel = CancellationToken::new();
    let result = query(&schema, &store, &args.store, Params::Url(&args.query), &cancel).await?;

    println!("{}", serde_json::to_string_pretty(&to_json(result))?);
    Ok(())
}

/// Reads newline-delimited JSON records and inserts each into `store`.
fn load_records(store: &MemoryStore, path: &std::path::Path) -> anyhow::Result<()> {
    let file = std::fs::File::open(path)?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(&line)?;
        store.insert(record)?;
    }
    Ok(())
}

/// Converts a [`QueryResult`] into a `serde_json::Value`, since the library
/// itself stays agnostic to any particular wire format.
fn to_json(result: QueryResult) -> Value {
    match result {
        QueryResult::Records(records) => Value::Array(records),
        QueryResult::Keys(keys) => Value::Array(keys.into_iter().map(Key::into_value).collect()),
        QueryResult::Lookup(map) => Value::Object(map.into_iter().collect()),
    }
}
