//! Provides the result materializer (spec §4.5): turns the merge-join's
//! ordered primary-key sequence into the requested output shape, reading
//! records from the store as needed and applying `$orderBy`.

use crate::error::QueryError;
use crate::key::Key;
use crate::path::{natural_cmp, CompiledPath};
use crate::predicate::{Controls, Format};
use crate::store::Store;
use crate::util::check_cancelled;

use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// The materialized query output, in the shape `$format` requested.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Records(Vec<Value>),
    Keys(Vec<Key>),
    Lookup(HashMap<String, Value>),
}

/// Reads the records named by `keys` and shapes them per `controls`.
///
/// `$orderBy` re-sorts after the read, since sorting needs each record's
/// path value; for `$format=keys` this still requires a read (spec §4.5)
/// even though the keys themselves are the only thing returned. Each
/// point-read is a suspension point (spec §5) and is checked against
/// `cancel`.
pub async fn materialize(
    keys: Vec<Key>,
    store: &dyn Store,
    controls: &Controls,
    cancel: &CancellationToken,
) -> Result<QueryResult, QueryError> {
    match controls.format {
        Format::Keys => {
            let keys = match &controls.order_by {
                Some(order_by) => sort_keys_by_path(keys, store, order_by, cancel).await?,
                None => keys,
            };
            Ok(QueryResult::Keys(keys))
        }
        Format::Lookup => {
            let mut map = HashMap::with_capacity(keys.len());
            for key in &keys {
                check_cancelled(cancel)?;
                if let Some(record) = store.read(key).await? {
                    map.insert(key.to_string(), record);
                }
            }
            Ok(QueryResult::Lookup(map))
        }
        Format::Records => {
            let mut records = Vec::with_capacity(keys.len());
            for key in &keys {
                check_cancelled(cancel)?;
                if let Some(record) = store.read(key).await? {
                    records.push(record);
                }
            }
            if let Some(order_by) = &controls.order_by {
                records.sort_by(|a, b| natural_cmp(order_by.resolve(a), order_by.resolve(b)));
            }
            Ok(QueryResult::Records(records))
        }
    }
}

async fn sort_keys_by_path(
    keys: Vec<Key>,
    store: &dyn Store,
    order_by: &CompiledPath,
    cancel: &CancellationToken,
) -> Result<Vec<Key>, QueryError> {
    let mut decorated = Vec::with_capacity(keys.len());
    for key in keys {
        check_cancelled(cancel)?;
        let record = store.read(&key).await?;
        let order_value = record.as_ref().and_then(|r| order_by.resolve(r).cloned());
        decorated.push((key, order_value));
    }
    decorated.sort_by(|(_, a), (_, b)| natural_cmp(a.as_ref(), b.as_ref()));
    Ok(decorated.into_iter().map(|(key, _)| key).collect())
}
