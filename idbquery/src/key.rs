//! Provides [`Key`], the primary-key and index-key wrapper, and its ordering.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A key produced by the primary-key path or a secondary-index path.
///
/// Wraps a [`serde_json::Value`] with a total order, since the store's
/// cursors need to compare keys of possibly-mixed JSON types. Ranking is by
/// JSON type first (null < bool < number < string < array < object), then
/// by value within a type. Numbers are compared as `f64`; strings are
/// compared byte-wise.
#[derive(Debug, Clone)]
pub struct Key(pub Value);

impl Key {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    fn type_rank(&self) -> u8 {
        match &self.0 {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank_cmp = self.type_rank().cmp(&other.type_rank());
        if rank_cmp != Ordering::Equal {
            return rank_cmp;
        }

        match (&self.0, &other.0) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .unwrap_or(f64::NAN)
                .partial_cmp(&b.as_f64().unwrap_or(f64::NAN))
                .unwrap_or(Ordering::Equal),
            (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = Key(x.clone()).cmp(&Key(y.clone()));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Object(a), Value::Object(b)) => {
                // Objects are not a meaningful key type; fall back to their
                // canonical string form so the comparator stays total.
                format!("{a:?}").cmp(&format!("{b:?}"))
            }
            _ => Ordering::Equal,
        }
    }
}

impl Hash for Key {
    /// Mirrors `Ord`/`Eq` field-for-field: numbers hash by `as_f64` bits
    /// (so `1` and `1.0` collide, matching `cmp`'s numeric comparison) and
    /// arrays hash each element through `Key::hash` recursively (matching
    /// `cmp`'s elementwise comparison), rather than hashing a type's debug
    /// rendering directly — that would let two `cmp`-equal keys hash
    /// unequal and violate the `Hash`/`Eq` contract.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Value::Null => state.write_u8(0),
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN).to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(items) => {
                state.write_usize(items.len());
                for item in items {
                    Key(item.clone()).hash(state);
                }
            }
            // Objects aren't a meaningful key type (see `cmp`); hashing the
            // same canonical string form `cmp` falls back to keeps the two
            // consistent, even though neither is a structural comparison.
            Value::Object(o) => format!("{o:?}").hash(state),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}
