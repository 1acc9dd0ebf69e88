//! # idbquery
//!
//! A declarative query evaluator for indexed-object-store-shaped record
//! stores: parse a URL-style parameter map into predicates, pick the
//! cheapest cursor strategy for each one (primary key, secondary index, or
//! full scan), and merge-join the results under `and`/`or` semantics with
//! paging, ordering, and output-shape controls.
//!
//! The evaluator is storage-agnostic — it only needs an implementation of
//! [`Store`] — so it can run against an in-memory store (bundled here as
//! [`MemoryStore`], handy for tests and the CLI) or any other backing
//! record source that can produce ordered key-range cursors.
//!
//! ```
//! use idbquery::{query, MemoryStore, Params, Schema, StoreSchema};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store_schema = StoreSchema::new("files", "pk");
//! let store = MemoryStore::new(store_schema.clone());
//! store.insert(serde_json::json!({"pk": "a", "value": {"title": "hello"}})).unwrap();
//!
//! let schema = Schema::new().with_store(store_schema);
//! let cancel = CancellationToken::new();
//!
//! let result = query(&schema, &store, "files", Params::Url("pk=a"), &cancel)
//!     .await
//!     .unwrap();
//! # }
//! ```

mod cursor;
mod error;
mod join;
mod key;
mod materialize;
mod memory;
mod path;
mod predicate;
mod query;
mod range;
mod schema;
mod store;
mod util;

#[cfg(test)]
mod properties;

pub use error::QueryError;
pub use key::Key;
pub use materialize::QueryResult;
pub use memory::MemoryStore;
pub use path::{natural_cmp, CompiledPath};
pub use predicate::{parse, Controls, Format, JoinMode, Op, Params, ParsedQuery, Predicate};
pub use query::query;
pub use range::Range;
pub use schema::{IndexSchema, Schema, StoreSchema};
pub use store::{Store, StoreCursor};
