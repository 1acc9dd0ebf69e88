//! Provides the query entry point (spec §4.6): the single async function
//! that ties parsing, classification, the merge-join, and materialization
//! together.

use crate::cursor::JoinCursor;
use crate::error::QueryError;
use crate::join::Join;
use crate::materialize::{materialize, QueryResult};
use crate::predicate::{parse, Params};
use crate::schema::Schema;
use crate::store::Store;
use crate::util::check_cancelled;

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Evaluates a query against `store_name` in `schema`, using `store` as the
/// backing record source.
///
/// Validates that `store_name` is declared, parses `params` into predicates
/// and controls, and — unless the predicate list is empty, in which case
/// the null-query short-circuit applies (spec §4.2) — builds one cursor per
/// predicate, runs the merge-join coordinator, and materializes the result.
///
/// `store.close()` is called on every exit path — success, early
/// termination, a propagated error, or cancellation (spec §5) — regardless
/// of which stage of evaluation produced the outcome.
pub async fn query(
    schema: &Schema,
    store: &dyn Store,
    store_name: &str,
    params: Params<'_>,
    cancel: &CancellationToken,
) -> Result<QueryResult, QueryError> {
    let outcome = evaluate(schema, store, store_name, params, cancel).await;
    match (outcome, store.close().await) {
        (Ok(result), Ok(())) => Ok(result),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), _) => Err(err),
    }
}

async fn evaluate(
    schema: &Schema,
    store: &dyn Store,
    store_name: &str,
    params: Params<'_>,
    cancel: &CancellationToken,
) -> Result<QueryResult, QueryError> {
    check_cancelled(cancel)?;

    let store_schema = schema.store(store_name)?;
    let parsed = parse(params)?;

    if parsed.predicates.is_empty() {
        trace!(store = store_name, "null query, short-circuiting to materialize");
        return materialize(Vec::new(), store, &parsed.controls, cancel).await;
    }

    trace!(store = store_name, predicates = parsed.predicates.len(), "opening cursors");
    let mut cursors = Vec::with_capacity(parsed.predicates.len());
    for predicate in &parsed.predicates {
        cursors.push(JoinCursor::open(store, predicate, store_schema, cancel).await?);
    }

    let join = Join::new(cursors, parsed.controls.clone());
    let keys = join.run(cancel).await?;
    trace!(store = store_name, matched = keys.len(), "join produced keys");

    materialize(keys, store, &parsed.controls, cancel).await
}
