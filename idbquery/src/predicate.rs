//! Provides predicate parsing: turning a parameter map or URL-encoded query
//! string into a normalized list of [`Predicate`]s plus a [`Controls`] set.

use crate::error::QueryError;
use crate::path::CompiledPath;

use serde_json::Value;
use std::collections::HashMap;

/// The operator a single predicate applies to its target.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `target$value` or bare `target=v` — equality.
    Equal(Value),
    /// `target$prefix` — string prefix match.
    Prefix(String),
    /// `target$from`/`target$to`, possibly paired — an inclusive range.
    /// `lo == None` means lower-open; `hi == None` means upper-open.
    Range {
        lo: Option<Value>,
        hi: Option<Value>,
    },
}

/// A single normalized predicate: a compiled target path plus an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub target: CompiledPath,
    pub op: Op,
}

impl Predicate {
    pub fn new(target: impl Into<CompiledPath>, op: Op) -> Self {
        Self {
            target: target.into(),
            op,
        }
    }

    /// Checks whether this predicate holds for `record`, via the path
    /// resolver. Used by scan cursors and by `and`/`or` in-memory matching.
    pub fn matches(&self, record: &Value) -> bool {
        let value = self.target.resolve(record);
        match &self.op {
            Op::Equal(expected) => value == Some(expected),
            Op::Prefix(prefix) => match value {
                Some(Value::String(s)) => s.starts_with(prefix.as_str()),
                // Non-string values: coerce to their JSON string rendering.
                // Documented as implementation-defined in spec §9.
                Some(other) => other.to_string().starts_with(prefix.as_str()),
                None => false,
            },
            Op::Range { lo, hi } => {
                let value = match value {
                    Some(v) => v,
                    None => return false,
                };
                let above_lo = lo
                    .as_ref()
                    .map(|lo| crate::key::Key(value.clone()) >= crate::key::Key(lo.clone()))
                    .unwrap_or(true);
                let below_hi = hi
                    .as_ref()
                    .map(|hi| crate::key::Key(value.clone()) <= crate::key::Key(hi.clone()))
                    .unwrap_or(true);
                above_lo && below_hi
            }
        }
    }
}

/// How multiple predicates combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    And,
    Or,
}

/// The requested output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Records,
    Keys,
    Lookup,
}

/// The parsed, validated control parameters (everything `$`-prefixed).
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub join: JoinMode,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub limit: Option<u64>,
    pub format: Format,
    pub order_by: Option<CompiledPath>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            join: JoinMode::And,
            from: None,
            to: None,
            limit: None,
            format: Format::Records,
            order_by: None,
        }
    }
}

/// The result of parsing: a normalized predicate list plus its controls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedQuery {
    pub predicates: Vec<Predicate>,
    pub controls: Controls,
}

/// Either a caller-built parameter map or a raw URL-encoded query string.
pub enum Params<'a> {
    Map(HashMap<String, String>),
    Url(&'a str),
}

impl<'a> From<&'a str> for Params<'a> {
    fn from(s: &'a str) -> Self {
        Self::Url(s)
    }
}

impl From<HashMap<String, String>> for Params<'static> {
    fn from(map: HashMap<String, String>) -> Self {
        Self::Map(map)
    }
}

/// Parses `params` into a normalized [`ParsedQuery`].
///
/// Duplicate keys in the URL-encoded form take the *last* occurrence, per
/// standard parameter-bag semantics. `$from`/`$to` pairing is
/// order-independent: entries are bucketed by target before `from`/`to` are
/// merged, so `a$from=x&a$to=y` and `a$to=y&a$from=x` parse identically.
pub fn parse(params: Params) -> Result<ParsedQuery, QueryError> {
    let map = match params {
        Params::Map(map) => map,
        Params::Url(raw) => {
            let mut map = HashMap::new();
            for (k, v) in url::form_urlencoded::parse(raw.as_bytes()) {
                map.insert(k.into_owned(), v.into_owned());
            }
            map
        }
    };

    let mut controls = Controls::default();

    // target -> (value, prefix, from, to)
    #[derive(Default)]
    struct Bucket {
        value: Option<String>,
        prefix: Option<String>,
        from: Option<String>,
        to: Option<String>,
    }

    let mut buckets: HashMap<String, Bucket> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (key, value) in map {
        if let Some(control) = key.strip_prefix('$') {
            apply_control(&mut controls, control, &value)?;
            continue;
        }

        let (target, op_name) = match key.split_once('$') {
            Some((target, op)) => (target.to_string(), op.to_string()),
            None => (key.clone(), "value".to_string()),
        };

        if !buckets.contains_key(&target) {
            order.push(target.clone());
        }
        let bucket = buckets.entry(target.clone()).or_default();

        match op_name.as_str() {
            "value" => bucket.value = Some(value),
            "prefix" => bucket.prefix = Some(value),
            "from" => bucket.from = Some(value),
            "to" => bucket.to = Some(value),
            other => {
                return Err(QueryError::InvalidArgument(format!(
                    "unknown operator `{other}` on target `{target}`"
                )))
            }
        }
    }

    if let (Some(from), Some(to)) = (&controls.from, &controls.to) {
        if to < from {
            return Err(QueryError::InvalidArgument(
                "$to must not be less than $from".to_string(),
            ));
        }
    }

    let mut predicates = Vec::new();
    for target in order {
        let bucket = buckets.remove(&target).expect("just inserted");
        let path = CompiledPath::compile(&target);

        if let Some(raw) = bucket.value {
            predicates.push(Predicate::new(path.clone(), Op::Equal(parse_scalar(&raw))));
        }
        if let Some(raw) = bucket.prefix {
            if raw.is_empty() {
                return Err(QueryError::InvalidArgument(format!(
                    "prefix predicate on `{target}` must be non-empty"
                )));
            }
            predicates.push(Predicate::new(path.clone(), Op::Prefix(raw)));
        }
        if bucket.from.is_some() || bucket.to.is_some() {
            predicates.push(Predicate::new(
                path,
                Op::Range {
                    lo: bucket.from.as_deref().map(parse_scalar),
                    hi: bucket.to.as_deref().map(parse_scalar),
                },
            ));
        }
    }

    Ok(ParsedQuery {
        predicates,
        controls,
    })
}

fn apply_control(controls: &mut Controls, name: &str, value: &str) -> Result<(), QueryError> {
    match name {
        "join" => {
            controls.join = match value {
                "and" => JoinMode::And,
                "or" => JoinMode::Or,
                other => {
                    return Err(QueryError::InvalidArgument(format!(
                        "$join must be `and` or `or`, got `{other}`"
                    )))
                }
            };
        }
        "from" => controls.from = Some(parse_nonneg_int(value, "$from")?),
        "to" => controls.to = Some(parse_nonneg_int(value, "$to")?),
        "limit" => controls.limit = Some(parse_nonneg_int(value, "$limit")?),
        "format" => {
            controls.format = match value {
                "records" => Format::Records,
                "keys" => Format::Keys,
                "lookup" => Format::Lookup,
                other => {
                    return Err(QueryError::InvalidArgument(format!(
                        "$format must be `records`, `keys`, or `lookup`, got `{other}`"
                    )))
                }
            };
        }
        "orderBy" => controls.order_by = Some(CompiledPath::compile(value)),
        other => {
            return Err(QueryError::InvalidArgument(format!(
                "unknown control parameter `${other}`"
            )))
        }
    }
    Ok(())
}

fn parse_nonneg_int(value: &str, field: &str) -> Result<u64, QueryError> {
    value
        .parse::<u64>()
        .map_err(|_| QueryError::InvalidArgument(format!("{field} must be a non-negative integer, got `{value}`")))
}

/// Best-effort scalar coercion for predicate values arriving as strings off
/// the wire: numbers and booleans are recognized, everything else stays a
/// JSON string (matching how a URL query string has no native typing).
fn parse_scalar(raw: &str) -> Value {
    if raw == "true" {
        Value::Bool(true)
    } else if raw == "false" {
        Value::Bool(false)
    } else if let Ok(n) = raw.parse::<f64>() {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string()))
    } else {
        Value::String(raw.to_string())
    }
}
