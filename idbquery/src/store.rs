//! Provides the store collaborator contract (spec §6): the abstract
//! interface the evaluator consumes, independent of any particular
//! indexed-object-store runtime.

use crate::error::QueryError;
use crate::key::Key;
use crate::range::Range;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

/// A handle onto one record store. The evaluator only ever asks for
/// cursors, point reads, and the store's declared primary-key path and
/// index names — it never touches storage directly.
#[async_trait]
pub trait Store: Send + Sync {
    fn primary_key_path(&self) -> &str;

    fn index_names(&self) -> HashSet<String>;

    async fn open_primary_key_cursor(
        &self,
        range: Range,
    ) -> Result<Box<dyn StoreCursor>, QueryError>;

    async fn open_index_cursor(
        &self,
        index_name: &str,
        range: Range,
    ) -> Result<Box<dyn StoreCursor>, QueryError>;

    async fn read(&self, key: &Key) -> Result<Option<Value>, QueryError>;

    /// Batched point reads. Defaults to one `read` per key; a real store
    /// collaborator can override this to issue a single batched lookup.
    async fn read_all(&self, keys: &[Key]) -> Result<Vec<Option<Value>>, QueryError> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.read(key).await?);
        }
        Ok(out)
    }

    /// Releases the handle. The query entry point calls this on every exit
    /// path (success, early termination, error, cancellation), per spec §5.
    /// Defaults to a no-op, since a handle shared across concurrent queries
    /// (also spec §5) typically has nothing query-scoped to release here —
    /// a collaborator backed by a real connection overrides it.
    async fn close(&self) -> Result<(), QueryError> {
        Ok(())
    }
}

/// A stateful cursor over a contiguous key range of a store or an index.
///
/// Implementations must advance in ascending primary-key order — the merge
/// coordinator's `or`-join correctness depends on this precondition (spec
/// §9) and does not re-derive it.
#[async_trait]
pub trait StoreCursor: Send {
    /// The key the cursor is currently positioned at (the index key for an
    /// index cursor, the primary key for a PK cursor). `None` once done.
    fn current_key(&self) -> Option<&Key>;

    /// The primary key of the record the cursor currently points at. For
    /// PK cursors this equals `current_key`; for index cursors it is the
    /// primary key the index entry refers to.
    fn current_primary_key(&self) -> Option<&Key>;

    /// The record the cursor currently points at, if already loaded.
    fn current_value(&self) -> Option<&Value>;

    /// Advances the cursor by one position. A suspension point: the
    /// underlying store may need to await its own I/O here.
    async fn advance(&mut self) -> Result<(), QueryError>;

    fn done(&self) -> bool;
}
