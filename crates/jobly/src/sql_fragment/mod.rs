//! SQL fragment builder.
//!
//! Turns loosely-typed request payloads into parameterized clause text:
//!
//! - [`build_set_clause`] renders the `SET` column list of a partial update.
//! - [`build_where_clause`] renders a `WHERE` clause from filter criteria,
//!   ignoring criteria it does not recognize.
//!
//! Both return a [`Fragment`]: clause text with `$1, $2, ...` placeholders and
//! the values to bind, in placeholder order. Callers splice the clause into a
//! larger statement and continue numbering from [`Fragment::next_placeholder`].
//!
//! # Example
//!
//! ```ignore
//! use jobly::sql_fragment::{build_set_clause, FieldMap};
//! use serde_json::json;
//!
//! let fields = FieldMap::new(&[("firstName", "first_name")]);
//! let set = build_set_clause(&json!({"firstName": "Aliya", "age": 32}), &fields)?;
//! assert_eq!(set.clause, r#""first_name"=$1, "age"=$2"#);
//!
//! let sql = format!(
//!     "UPDATE users SET {} WHERE username = ${}",
//!     set.clause,
//!     set.next_placeholder()
//! );
//! ```

mod criteria;
mod fields;


pub use criteria::{CriterionMap, FilterDef};
pub use fields::FieldMap;

use crate::error::{JoblyError, JoblyResult};
use crate::value::SqlValue;
use serde_json::{Map, Value};
use std::fmt::Write as _;
use tokio_postgres::types::ToSql;

/// Clause text paired with the values its placeholders refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Clause text with `$n` placeholders, numbered from 1.
    pub clause: String,
    /// One value per placeholder, in left-to-right order.
    pub values: Vec<SqlValue>,
}

impl Fragment {
    /// Whether the clause renders to nothing.
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// The ordinal a caller should use for its next own placeholder.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}

/// Build the `SET` column list for a partial update.
///
/// `update` must be a JSON object with at least one entry. Each key is mapped
/// to its column through `fields` (falling back to the key itself) and rendered
/// as `"column"=$n` in insertion order. `null` values are kept: they assign SQL
/// `NULL`.
///
/// # Errors
///
/// - [`JoblyError::InvalidArgument`] when `update` is not an object.
/// - [`JoblyError::EmptyUpdate`] when `update` has no entries.
pub fn build_set_clause(update: &Value, fields: &FieldMap) -> JoblyResult<Fragment> {
    let Value::Object(update) = update else {
        return Err(JoblyError::invalid_argument(format!(
            "update must be a mapping, got {}",
            json_kind(update)
        )));
    };
    set_clause(update, fields)
}

/// Typed counterpart of [`build_set_clause`] for an already-validated mapping.
pub fn set_clause(update: &Map<String, Value>, fields: &FieldMap) -> JoblyResult<Fragment> {
    if update.is_empty() {
        return Err(JoblyError::EmptyUpdate);
    }

    let mut clause = String::new();
    let mut values = Vec::with_capacity(update.len());
    for (n, (field, value)) in update.iter().enumerate() {
        if n > 0 {
            clause.push_str(", ");
        }
        push_quoted(&mut clause, fields.resolve(field));
        push_placeholder(&mut clause, '=', n + 1);
        values.push(SqlValue::from_json(value));
    }

    let fragment = Fragment { clause, values };
    trace_fragment("set", &fragment);
    Ok(fragment)
}

/// Build a `WHERE` clause from filter criteria.
///
/// Keys of `criteria` that `filters` does not define are ignored. Surviving
/// criteria are rendered in insertion order and joined with `AND`:
///
/// - `false` / `"false"` drops the criterion (no constraint).
/// - `true` / `"true"` emits the filter's fragment verbatim, binding nothing.
/// - any other scalar binds one parameter after a comparison operator; `ILIKE`
///   operators match it as a case-insensitive substring.
///
/// When every recognized criterion is dropped the result is an empty fragment.
///
/// # Errors
///
/// - [`JoblyError::NoValidCriteria`] when no key of `criteria` is defined in
///   `filters`.
/// - [`JoblyError::InvalidArgument`] when `criteria` is not an object, a
///   recognized value is `null` or non-scalar, or a presence filter is given
///   something other than a flag.
pub fn build_where_clause(criteria: &Value, filters: &CriterionMap) -> JoblyResult<Fragment> {
    let Value::Object(criteria) = criteria else {
        return Err(JoblyError::invalid_argument(format!(
            "criteria must be a mapping, got {}",
            json_kind(criteria)
        )));
    };
    where_clause(criteria, filters)
}

/// Typed counterpart of [`build_where_clause`] for an already-validated mapping.
pub fn where_clause(criteria: &Map<String, Value>, filters: &CriterionMap) -> JoblyResult<Fragment> {
    let recognized: Vec<(&str, &FilterDef, &Value)> = criteria
        .iter()
        .filter_map(|(name, value)| filters.get(name).map(|def| (name.as_str(), def, value)))
        .collect();

    if recognized.is_empty() {
        return Err(JoblyError::NoValidCriteria);
    }

    let mut predicates: Vec<String> = Vec::with_capacity(recognized.len());
    let mut values = Vec::new();
    for (name, def, raw) in recognized {
        let value = SqlValue::from_json(raw);
        match value {
            SqlValue::Null => {
                return Err(JoblyError::invalid_argument(format!(
                    "filter `{name}` has no value"
                )));
            }
            SqlValue::Json(_) => {
                return Err(JoblyError::invalid_argument(format!(
                    "filter `{name}` must be a scalar, got {}",
                    json_kind(raw)
                )));
            }
            _ => {}
        }

        match value.as_flag() {
            Some(false) => continue,
            Some(true) => {
                predicates.push(def.fragment().to_string());
                continue;
            }
            None => {}
        }

        match def {
            FilterDef::Presence { .. } => {
                return Err(JoblyError::invalid_argument(format!(
                    "filter `{name}` only accepts true or false"
                )));
            }
            FilterDef::Comparison {
                operator,
                like_wrap,
            } => {
                values.push(value);
                let n = values.len();
                let mut predicate = String::with_capacity(operator.len() + 32);
                predicate.push_str(operator);
                if *like_wrap {
                    let _ = write!(predicate, " CONCAT('%', ${n}::text, '%')");
                } else {
                    push_placeholder(&mut predicate, ' ', n);
                }
                predicates.push(predicate);
            }
        }
    }

    let clause = if predicates.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", predicates.join(" AND "))
    };

    let fragment = Fragment { clause, values };
    trace_fragment("where", &fragment);
    Ok(fragment)
}

fn push_quoted(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

fn push_placeholder(out: &mut String, sep: char, n: usize) {
    out.push(sep);
    out.push('$');
    let _ = write!(out, "{n}");
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn trace_fragment(kind: &'static str, fragment: &Fragment) {
    tracing::debug!(
        target: "jobly.sql",
        kind,
        clause = %fragment.clause,
        param_count = fragment.values.len(),
        "built sql fragment"
    );
}
