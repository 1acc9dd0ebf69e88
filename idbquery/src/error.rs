//! Provides the [`QueryError`] type.

use std::fmt::{self, Display};

/// Represents an error raised while parsing or executing a query.
///
/// Mirrors the error kinds a query evaluator can hit: malformed input,
/// an unknown store, a collaborator failure, or cooperative cancellation.
#[derive(Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum QueryError {
    /// A parameter, operator, or control value was malformed.
    InvalidArgument(String),
    /// `store_name` is not declared in the schema.
    SchemaMismatch(String),
    /// A store named in the schema could not be found by the collaborator.
    NotFound(String),
    /// An error was propagated from the store collaborator.
    StoreError(String),
    /// Cancellation was observed at a suspension point.
    Cancelled,
    /// An invariant was violated; indicates a bug in the evaluator.
    Internal(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::SchemaMismatch(store) => write!(f, "no such store in schema: {store}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::StoreError(msg) => write!(f, "store error: {msg}"),
            Self::Cancelled => write!(f, "query cancelled"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}
