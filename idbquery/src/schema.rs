//! Provides the read-only schema description a query is evaluated against.

use crate::error::QueryError;
use crate::path::CompiledPath;

use std::collections::HashMap;

/// Describes one declared secondary index on a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub key_path: CompiledPath,
    pub unique: bool,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, key_path: impl Into<CompiledPath>) -> Self {
        Self {
            name: name.into(),
            key_path: key_path.into(),
            unique: false,
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }
}

/// Describes one store: its primary-key path and its declared indexes.
///
/// Immutable for the lifetime of a query, per spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSchema {
    pub name: String,
    pub primary_key_path: CompiledPath,
    pub indexes: HashMap<String, IndexSchema>,
}

impl StoreSchema {
    pub fn new(name: impl Into<String>, primary_key_path: impl Into<CompiledPath>) -> Self {
        Self {
            name: name.into(),
            primary_key_path: primary_key_path.into(),
            indexes: HashMap::new(),
        }
    }

    pub fn with_index(mut self, index: IndexSchema) -> Self {
        self.indexes.insert(index.name.clone(), index);
        self
    }

    pub fn index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes.get(name)
    }
}

/// The full, read-only set of store descriptors a query can name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    stores: HashMap<String, StoreSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: StoreSchema) -> Self {
        self.stores.insert(store.name.clone(), store);
        self
    }

    /// Returns the named store's schema, or `SchemaMismatch` if undeclared.
    pub fn store(&self, name: &str) -> Result<&StoreSchema, QueryError> {
        self.stores
            .get(name)
            .ok_or_else(|| QueryError::SchemaMismatch(name.to_string()))
    }
}
