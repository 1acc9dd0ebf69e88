//! Provides [`MemoryStore`], an in-memory reference implementation of the
//! [`Store`] collaborator contract.
//!
//! Generalizes the teacher's flat, byte-offset `Source`/`InMemory` index
//! (a `HashMap<String, u64>` of document offsets) into typed, ordered
//! key-range indexes, since the query evaluator needs range scans rather
//! than point lookups. Interior mutability follows the teacher's own
//! `Arc<RwLock<Database>>` handle in `JasonDB`, so cursors can hold a
//! cloned handle without borrowing from the store.

use crate::error::QueryError;
use crate::key::Key;
use crate::range::Range;
use crate::schema::StoreSchema;
use crate::store::{Store, StoreCursor};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

#[derive(Default)]
struct Indexes {
    primary: BTreeMap<Key, Value>,
    secondary: HashMap<String, BTreeMap<Key, BTreeSet<Key>>>,
}

/// An in-memory, single-process store. Useful standalone for the in-browser
/// "client-side" emulation described in spec §1, and as the store this
/// crate's own tests and the CLI drive.
pub struct MemoryStore {
    schema: StoreSchema,
    data: Arc<RwLock<Indexes>>,
}

impl MemoryStore {
    pub fn new(schema: StoreSchema) -> Self {
        let secondary = schema
            .indexes
            .keys()
            .map(|name| (name.clone(), BTreeMap::new()))
            .collect();

        Self {
            schema,
            data: Arc::new(RwLock::new(Indexes {
                primary: BTreeMap::new(),
                secondary,
            })),
        }
    }

    /// Inserts or overwrites a record, maintaining every declared secondary
    /// index. Re-indexes correctly on overwrite: if an updated record's
    /// indexed value changed, the old index entry is removed first.
    pub fn insert(&self, record: Value) -> Result<Key, QueryError> {
        let pk = self
            .schema
            .primary_key_path
            .resolve(&record)
            .cloned()
            .ok_or_else(|| {
                QueryError::InvalidArgument("record is missing its primary key path".to_string())
            })?;
        let pk = Key::new(pk);

        let mut data = self.data.write();

        if let Some(old_record) = data.primary.get(&pk).cloned() {
            for index in self.schema.indexes.values() {
                if let Some(old_value) = index.key_path.resolve(&old_record) {
                    let old_key = Key::new(old_value.clone());
                    if let Some(bucket) = data.secondary.get_mut(&index.name) {
                        if let Some(set) = bucket.get_mut(&old_key) {
                            set.remove(&pk);
                            if set.is_empty() {
                                bucket.remove(&old_key);
                            }
                        }
                    }
                }
            }
        }

        for index in self.schema.indexes.values() {
            if let Some(value) = index.key_path.resolve(&record) {
                let index_key = Key::new(value.clone());
                data.secondary
                    .entry(index.name.clone())
                    .or_default()
                    .entry(index_key)
                    .or_default()
                    .insert(pk.clone());
            }
        }

        data.primary.insert(pk.clone(), record);
        trace!(store = self.schema.name.as_str(), pk = %pk, "inserted record");
        Ok(pk)
    }

    pub fn len(&self) -> usize {
        self.data.read().primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn primary_key_path(&self) -> &str {
        self.schema.primary_key_path.as_str()
    }

    fn index_names(&self) -> HashSet<String> {
        self.schema.indexes.keys().cloned().collect()
    }

    async fn open_primary_key_cursor(
        &self,
        range: Range,
    ) -> Result<Box<dyn StoreCursor>, QueryError> {
        let keys: Vec<Key> = {
            let data = self.data.read();
            data.primary
                .keys()
                .filter(|k| range.contains(k))
                .cloned()
                .collect()
        };

        Ok(Box::new(MemoryCursor::new(self.data.clone(), keys)))
    }

    async fn open_index_cursor(
        &self,
        index_name: &str,
        range: Range,
    ) -> Result<Box<dyn StoreCursor>, QueryError> {
        let (pks, index_keys): (Vec<Key>, Vec<Key>) = {
            let data = self.data.read();
            let bucket = data
                .secondary
                .get(index_name)
                .ok_or_else(|| QueryError::NotFound(format!("no such index: {index_name}")))?;

            // Flatten every matching index-key bucket's primary keys into
            // one globally-sorted set, keyed by primary key, so the cursor
            // upholds the ascending-PK precondition the merge coordinator
            // relies on (spec §9) while still remembering which index key
            // each primary key came from (needed for prefix guards).
            let mut by_pk: BTreeMap<Key, Key> = BTreeMap::new();
            for (index_key, set) in bucket {
                if range.contains(index_key) {
                    for pk in set {
                        by_pk.entry(pk.clone()).or_insert_with(|| index_key.clone());
                    }
                }
            }
            by_pk.into_iter().unzip()
        };

        Ok(Box::new(MemoryCursor::with_index_keys(
            self.data.clone(),
            pks,
            index_keys,
        )))
    }

    async fn read(&self, key: &Key) -> Result<Option<Value>, QueryError> {
        Ok(self.data.read().primary.get(key).cloned())
    }

    async fn read_all(&self, keys: &[Key]) -> Result<Vec<Option<Value>>, QueryError> {
        let data = self.data.read();
        Ok(keys.iter().map(|k| data.primary.get(k).cloned()).collect())
    }
}

/// Iterates a precomputed, already-ordered primary-key list, reading each
/// record's body lazily from the shared store handle. Primary-key cursors
/// and index cursors share this type; index cursors additionally carry the
/// index key each primary key was matched under, since `current_key` must
/// report the index key (not the primary key) for index cursors — the
/// prefix guard checks the former.
struct MemoryCursor {
    data: Arc<RwLock<Indexes>>,
    keys: Vec<Key>,
    index_keys: Option<Vec<Key>>,
    position: usize,
    current_value: Option<Value>,
}

impl MemoryCursor {
    fn new(data: Arc<RwLock<Indexes>>, keys: Vec<Key>) -> Self {
        let current_value = keys.first().and_then(|k| data.read().primary.get(k).cloned());

        Self {
            data,
            keys,
            index_keys: None,
            position: 0,
            current_value,
        }
    }

    fn with_index_keys(data: Arc<RwLock<Indexes>>, keys: Vec<Key>, index_keys: Vec<Key>) -> Self {
        let current_value = keys.first().and_then(|k| data.read().primary.get(k).cloned());

        Self {
            data,
            keys,
            index_keys: Some(index_keys),
            position: 0,
            current_value,
        }
    }
}

#[async_trait]
impl StoreCursor for MemoryCursor {
    fn current_key(&self) -> Option<&Key> {
        match &self.index_keys {
            Some(index_keys) => index_keys.get(self.position),
            None => self.keys.get(self.position),
        }
    }

    fn current_primary_key(&self) -> Option<&Key> {
        self.keys.get(self.position)
    }

    fn current_value(&self) -> Option<&Value> {
        self.current_value.as_ref()
    }

    async fn advance(&mut self) -> Result<(), QueryError> {
        self.position += 1;
        // Always look the record up by primary key, never `current_key()`:
        // for an index cursor `current_key()` is the index key, and the
        // primary map isn't keyed by that.
        self.current_value = self
            .current_primary_key()
            .and_then(|k| self.data.read().primary.get(k).cloned());
        Ok(())
    }

    fn done(&self) -> bool {
        self.position >= self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IndexSchema;
    use serde_json::json;

    fn files_schema() -> StoreSchema {
        StoreSchema::new("files", "pk").with_index(IndexSchema::new("group", "group"))
    }

    #[tokio::test]
    async fn inserts_and_reads_by_primary_key() {
        let store = MemoryStore::new(files_schema());
        store.insert(json!({"pk": "a", "group": "aaa"})).unwrap();

        let value = store.read(&Key::from("a")).await.unwrap();
        assert_eq!(value, Some(json!({"pk": "a", "group": "aaa"})));
    }

    #[tokio::test]
    async fn primary_key_cursor_iterates_in_ascending_order() {
        let store = MemoryStore::new(files_schema());
        for pk in ["ccc", "a", "bbb", "aa"] {
            store.insert(json!({"pk": pk, "group": "g"})).unwrap();
        }

        let mut cursor = store.open_primary_key_cursor(Range::Unbounded).await.unwrap();
        let mut seen = Vec::new();
        while !cursor.done() {
            seen.push(cursor.current_primary_key().unwrap().to_string());
            cursor.advance().await.unwrap();
        }

        assert_eq!(seen, vec!["a", "aa", "bbb", "ccc"]);
    }

    #[tokio::test]
    async fn index_cursor_reindexes_on_overwrite() {
        let store = MemoryStore::new(files_schema());
        store.insert(json!({"pk": "a", "group": "old"})).unwrap();
        store.insert(json!({"pk": "a", "group": "new"})).unwrap();

        let old_cursor = store
            .open_index_cursor("group", Range::Singleton(Key::from("old")))
            .await
            .unwrap();
        assert!(old_cursor.done());

        let mut new_cursor = store
            .open_index_cursor("group", Range::Singleton(Key::from("new")))
            .await
            .unwrap();
        assert!(!new_cursor.done());
        assert_eq!(new_cursor.current_primary_key(), Some(&Key::from("a")));
        new_cursor.advance().await.unwrap();
        assert!(new_cursor.done());
    }

    #[tokio::test]
    async fn index_cursor_current_key_reports_the_index_key_not_the_primary_key() {
        let store = MemoryStore::new(files_schema());
        store.insert(json!({"pk": "b", "group": "aaa"})).unwrap();
        store.insert(json!({"pk": "a", "group": "aab"})).unwrap();

        let cursor = store
            .open_index_cursor("group", Range::Unbounded)
            .await
            .unwrap();

        assert_eq!(cursor.current_primary_key(), Some(&Key::from("a")));
        assert_eq!(cursor.current_key(), Some(&Key::from("aab")));
    }

    #[tokio::test]
    async fn index_cursor_current_value_stays_correct_after_advancing() {
        let store = MemoryStore::new(files_schema());
        store.insert(json!({"pk": "a", "group": "aaa"})).unwrap();
        store.insert(json!({"pk": "b", "group": "bbb"})).unwrap();

        let mut cursor = store
            .open_index_cursor("group", Range::Unbounded)
            .await
            .unwrap();

        assert_eq!(cursor.current_value(), Some(&json!({"pk": "a", "group": "aaa"})));
        cursor.advance().await.unwrap();
        assert_eq!(cursor.current_value(), Some(&json!({"pk": "b", "group": "bbb"})));
    }
}
