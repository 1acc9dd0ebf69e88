//! Provides the cursor classifier and cursor drivers (spec §4.3).

use crate::error::QueryError;
use crate::key::Key;
use crate::predicate::{Op, Predicate};
use crate::range::Range;
use crate::schema::StoreSchema;
use crate::store::{Store, StoreCursor};
use crate::util::check_cancelled;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Which execution strategy a predicate's target resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Pk,
    Index(String),
    Scan,
}

/// Classifies a predicate against the schema: PK path, declared index, or
/// (fallback) a full scan with a per-record match. Modeled as a tagged
/// variant rather than polymorphic dispatch, per spec §9.
pub fn classify(predicate: &Predicate, schema: &StoreSchema) -> Source {
    let target = predicate.target.as_str();
    if target == schema.primary_key_path.as_str() {
        Source::Pk
    } else if let Some(index) = schema.index(target) {
        Source::Index(index.name.clone())
    } else {
        Source::Scan
    }
}

/// Builds the concrete key range a PK/Index cursor should be opened
/// against, plus an optional string prefix the cursor driver must keep
/// checking on every tick (the store contract has no native "prefix"
/// range kind — spec §6 lists only the five range shapes below).
fn range_and_prefix(op: &Op) -> (Range, Option<String>) {
    match op {
        Op::Equal(v) => (Range::Singleton(Key::new(v.clone())), None),
        Op::Prefix(s) => (Range::Lower(Key::new(Value::String(s.clone()))), Some(s.clone())),
        Op::Range { lo, hi } => {
            let range = match (lo, hi) {
                (Some(lo), Some(hi)) => Range::Bounded(Key::new(lo.clone()), Key::new(hi.clone())),
                (Some(lo), None) => Range::Lower(Key::new(lo.clone())),
                (None, Some(hi)) => Range::Upper(Key::new(hi.clone())),
                (None, None) => Range::Unbounded,
            };
            (range, None)
        }
    }
}

/// Coerces a key to its string form for prefix matching, the same
/// implementation-defined coercion [`Predicate::matches`] uses for scans
/// (spec §9).
fn key_starts_with(key: &Key, prefix: &str) -> bool {
    match key.as_value() {
        Value::String(s) => s.starts_with(prefix),
        other => other.to_string().starts_with(prefix),
    }
}

/// One cursor driving the merge-join: wraps a store cursor and, depending
/// on the predicate it was built from, a prefix guard or a scan predicate
/// that causes it to auto-advance past non-matching rows.
pub(crate) struct JoinCursor {
    inner: Box<dyn StoreCursor>,
    prefix: Option<String>,
    scan_predicate: Option<Predicate>,
    done: bool,
}

impl JoinCursor {
    pub async fn open(
        store: &dyn Store,
        predicate: &Predicate,
        schema: &StoreSchema,
        cancel: &CancellationToken,
    ) -> Result<Self, QueryError> {
        check_cancelled(cancel)?;

        let (inner, prefix, scan_predicate) = match classify(predicate, schema) {
            Source::Pk => {
                let (range, prefix) = range_and_prefix(&predicate.op);
                (store.open_primary_key_cursor(range).await?, prefix, None)
            }
            Source::Index(name) => {
                let (range, prefix) = range_and_prefix(&predicate.op);
                (store.open_index_cursor(&name, range).await?, prefix, None)
            }
            Source::Scan => (
                store.open_primary_key_cursor(Range::Unbounded).await?,
                None,
                Some(predicate.clone()),
            ),
        };

        let mut cursor = Self {
            inner,
            prefix,
            scan_predicate,
            done: false,
        };
        cursor.settle(cancel).await?;
        Ok(cursor)
    }

    /// Skips forward past non-matching rows (scan cursors, and the prefix
    /// guard on PK/Index cursors), leaving the cursor positioned at the next
    /// row the coordinator should see, or marked done.
    ///
    /// The prefix guard must *skip* rather than stop-on-first-mismatch: a PK
    /// cursor's candidate pool is already range-bounded to keys lexically
    /// `>=` the prefix, so once a key stops matching, every later key in
    /// that ascending scan won't match either and this degenerates to one
    /// extra no-op tick before exhaustion. But an index cursor's candidate
    /// pool is re-sorted by primary key (store §6's contract requires PK
    /// ascending order from every cursor), not by index key, so a
    /// non-matching index key can sit between two matching ones — stopping
    /// outright there would silently drop the rest of the match set.
    async fn settle(&mut self, cancel: &CancellationToken) -> Result<(), QueryError> {
        loop {
            check_cancelled(cancel)?;

            if self.inner.done() {
                self.done = true;
                return Ok(());
            }

            if let Some(prefix) = &self.prefix {
                let matches = self
                    .inner
                    .current_key()
                    .map(|k| key_starts_with(k, prefix))
                    .unwrap_or(false);
                if !matches {
                    self.inner.advance().await?;
                    continue;
                }
            }

            if let Some(predicate) = &self.scan_predicate {
                let matches = self
                    .inner
                    .current_value()
                    .map(|record| predicate.matches(record))
                    .unwrap_or(false);
                if !matches {
                    self.inner.advance().await?;
                    continue;
                }
            }

            return Ok(());
        }
    }

    /// The primary key of the current row, or `None` once exhausted.
    pub fn primary_key(&self) -> Option<&Key> {
        if self.done {
            None
        } else {
            self.inner.current_primary_key()
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub async fn advance(&mut self, cancel: &CancellationToken) -> Result<(), QueryError> {
        check_cancelled(cancel)?;
        if self.done {
            return Ok(());
        }
        self.inner.advance().await?;
        self.settle(cancel).await
    }
}
