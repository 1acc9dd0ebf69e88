//! Loads the on-disk schema description the CLI's `query` subcommand reads
//! before it can build an in-memory [`Schema`](idbquery::Schema).

use idbquery::{IndexSchema, Schema, StoreSchema};

use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct SchemaFile {
    stores: Vec<StoreFile>,
}

#[derive(Deserialize)]
struct StoreFile {
    name: String,
    #[serde(rename = "primaryKeyPath")]
    primary_key_path: String,
    #[serde(default)]
    indexes: Vec<IndexFile>,
}

#[derive(Deserialize)]
struct IndexFile {
    name: String,
    #[serde(rename = "keyPath")]
    key_path: String,
    #[serde(default)]
    unique: bool,
}

/// Reads and parses a schema JSON file into a [`Schema`].
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let raw = std::fs::read_to_string(path)?;
    let file: SchemaFile = serde_json::from_str(&raw)?;

    let mut schema = Schema::new();
    for store in file.stores {
        let mut store_schema = StoreSchema::new(store.name, store.primary_key_path);
        for index in store.indexes {
            store_schema = store_schema.with_index(IndexSchema::new(index.name, index.key_path).unique(index.unique));
        }
        schema = schema.with_store(store_schema);
    }

    Ok(schema)
}
