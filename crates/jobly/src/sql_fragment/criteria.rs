use super::json_kind;
use crate::error::{JoblyError, JoblyResult};
use serde_json::Value;
use std::borrow::Cow;

/// How a recognized filter criterion renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDef {
    /// `<operator> $n`, e.g. `salary >=`.
    ///
    /// With `like_wrap` the operand is matched as a substring:
    /// `<operator> CONCAT('%', $n::text, '%')`.
    Comparison {
        operator: Cow<'static, str>,
        like_wrap: bool,
    },
    /// A complete predicate with no operand, e.g. `equity > 0`.
    ///
    /// Applied when the criterion is `true`, skipped when `false`.
    Presence { predicate: Cow<'static, str> },
}

impl FilterDef {
    /// A comparison filter; `ILIKE` operators get substring matching.
    pub fn comparison(operator: impl Into<Cow<'static, str>>) -> Self {
        let operator = operator.into();
        let like_wrap = operator.contains("ILIKE");
        Self::Comparison {
            operator,
            like_wrap,
        }
    }

    /// A presence filter applying `predicate` as-is.
    pub fn presence(predicate: impl Into<Cow<'static, str>>) -> Self {
        Self::Presence {
            predicate: predicate.into(),
        }
    }

    /// A filter from a raw fragment whose shape is not declared.
    ///
    /// The criterion value alone decides how it renders: a flag emits the
    /// fragment verbatim (or drops it), any other scalar is bound after it.
    pub fn from_fragment(fragment: impl Into<Cow<'static, str>>) -> Self {
        Self::comparison(fragment)
    }

    /// The fragment text as written in the criterion map.
    pub fn fragment(&self) -> &str {
        match self {
            Self::Comparison { operator, .. } => &**operator,
            Self::Presence { predicate } => &**predicate,
        }
    }
}

/// Lookup table from filter names to their [`FilterDef`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriterionMap {
    entries: Vec<(Cow<'static, str>, FilterDef)>,
}

impl CriterionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter definition (builder style).
    pub fn with(mut self, name: &'static str, def: FilterDef) -> Self {
        self.entries.push((Cow::Borrowed(name), def));
        self
    }

    /// Add a comparison filter, e.g. `("minSalary", "salary >=")`.
    pub fn comparison(self, name: &'static str, operator: &'static str) -> Self {
        self.with(name, FilterDef::comparison(operator))
    }

    /// Add a presence filter, e.g. `("hasEquity", "equity > 0")`.
    pub fn presence(self, name: &'static str, predicate: &'static str) -> Self {
        self.with(name, FilterDef::presence(predicate))
    }

    /// Build a map from static `(name, fragment)` pairs through
    /// [`FilterDef::from_fragment`].
    pub fn from_fragments(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|&(name, fragment)| (Cow::Borrowed(name), FilterDef::from_fragment(fragment)))
                .collect(),
        }
    }

    /// Build a map from a loosely-typed JSON object of fragment strings.
    ///
    /// # Errors
    ///
    /// [`JoblyError::InvalidArgument`] when `map` is not an object or holds a
    /// non-string fragment.
    pub fn from_json(map: &Value) -> JoblyResult<Self> {
        let Value::Object(map) = map else {
            return Err(JoblyError::invalid_argument(format!(
                "criterion map must be a mapping, got {}",
                json_kind(map)
            )));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (name, fragment) in map {
            let Value::String(fragment) = fragment else {
                return Err(JoblyError::invalid_argument(format!(
                    "fragment for filter `{name}` must be a string, got {}",
                    json_kind(fragment)
                )));
            };
            entries.push((
                Cow::Owned(name.clone()),
                FilterDef::from_fragment(fragment.clone()),
            ));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&FilterDef> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
