use super::json_kind;
use crate::error::{JoblyError, JoblyResult};
use serde_json::Value;
use std::borrow::Cow;

/// Lookup table from logical field names to store column names.
///
/// Fields whose column has the same name are usually left out; [`FieldMap::resolve`]
/// falls back to the field name for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(Cow<'static, str>, Cow<'static, str>)>,
}

impl FieldMap {
    /// Build a map from static `(field, column)` pairs.
    pub fn new(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|&(field, column)| (Cow::Borrowed(field), Cow::Borrowed(column)))
                .collect(),
        }
    }

    /// A map with no entries: every field is its own column.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a map from a loosely-typed JSON object of string values.
    ///
    /// # Errors
    ///
    /// [`JoblyError::InvalidArgument`] when `map` is missing (`null`), not an
    /// object, or holds a non-string column name.
    pub fn from_json(map: &Value) -> JoblyResult<Self> {
        let Value::Object(map) = map else {
            return Err(JoblyError::invalid_argument(format!(
                "field map must be a mapping, got {}",
                json_kind(map)
            )));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (field, column) in map {
            let Value::String(column) = column else {
                return Err(JoblyError::invalid_argument(format!(
                    "column for field `{field}` must be a string, got {}",
                    json_kind(column)
                )));
            };
            entries.push((Cow::Owned(field.clone()), Cow::Owned(column.clone())));
        }
        Ok(Self { entries })
    }

    /// The mapped column for `field`, if the map lists it.
    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, column)| &**column)
    }

    /// The column for `field`, or `field` itself when unmapped.
    pub fn resolve<'a>(&'a self, field: &'a str) -> &'a str {
        self.column_for(field).unwrap_or(field)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
