//! Companies, jobs and users.
//!
//! Every operation takes `&impl GenericClient`, so callers decide whether it
//! runs on its own connection or inside their transaction.

pub mod company;
pub mod job;
pub mod user;

pub use company::{Company, CompanyDetail, NewCompany};
pub use job::{Job, JobDetail, NewJob};
pub use user::{NewUser, User, UserDetail};

use crate::error::{JoblyError, JoblyResult};
use crate::sql_fragment::{CriterionMap, FilterDef, Fragment, json_kind, where_clause};
use crate::value::SqlValue;
use serde_json::{Map, Value};

/// Check an update payload is a mapping of fields the model allows changing.
fn updatable_fields<'a>(data: &'a Value, allowed: &[&str]) -> JoblyResult<&'a Map<String, Value>> {
    let Value::Object(map) = data else {
        return Err(JoblyError::invalid_argument(format!(
            "update must be a mapping, got {}",
            json_kind(data)
        )));
    };
    if let Some(field) = map.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(JoblyError::bad_request(format!(
            "field `{field}` cannot be updated"
        )));
    }
    Ok(map)
}

/// Filter criteria as a mapping; `null` and `{}` mean "no filtering".
fn filter_criteria(filters: &Value) -> JoblyResult<Option<&Map<String, Value>>> {
    match filters {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(JoblyError::invalid_argument(format!(
            "filters must be a mapping, got {}",
            json_kind(other)
        ))),
    }
}

/// Build the WHERE fragment for optional criteria.
///
/// Comparison filters need an operand, so `true`/`false` are refused for
/// them instead of rendering a bare operator.
fn where_fragment(
    criteria: Option<&Map<String, Value>>,
    filters: &CriterionMap,
) -> JoblyResult<Fragment> {
    let Some(criteria) = criteria else {
        return Ok(Fragment::default());
    };
    for (name, value) in criteria {
        if let Some(FilterDef::Comparison { .. }) = filters.get(name) {
            if SqlValue::from_json(value).as_flag().is_some() {
                return Err(JoblyError::bad_request(format!(
                    "{name} needs a value, got {value}"
                )));
            }
        }
    }
    where_clause(criteria, filters)
}

/// `base [fragment] tail`, without stray spaces when the fragment is empty.
fn splice(base: &str, fragment: &Fragment, tail: &str) -> String {
    let mut sql = String::with_capacity(base.len() + fragment.clause.len() + tail.len() + 2);
    sql.push_str(base);
    if !fragment.is_empty() {
        sql.push(' ');
        sql.push_str(&fragment.clause);
    }
    if !tail.is_empty() {
        sql.push(' ');
        sql.push_str(tail);
    }
    sql
}

/// Read an `INTEGER` criterion sent as a number or numeric string.
fn int_criterion(criteria: &Map<String, Value>, key: &str) -> JoblyResult<Option<i32>> {
    let invalid = || JoblyError::bad_request(format!("{key} must be an integer"));
    match criteria.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(other) => Err(JoblyError::bad_request(format!(
            "{key} must be an integer, got {}",
            json_kind(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_fragment::CriterionMap;
    use serde_json::json;

    #[test]
    fn updatable_fields_rejects_unknown_keys() {
        let data = json!({"title": "x", "companyHandle": "c2"});
        let err = updatable_fields(&data, &["title", "salary"]).unwrap_err();
        assert!(matches!(err, JoblyError::BadRequest(_)));
    }

    #[test]
    fn updatable_fields_accepts_empty_mapping() {
        let data = json!({});
        assert!(updatable_fields(&data, &["title"]).unwrap().is_empty());
        assert!(updatable_fields(&json!([]), &["title"]).is_err());
    }

    #[test]
    fn empty_filters_mean_no_where_clause() {
        let filters = CriterionMap::new().comparison("title", "title ILIKE");
        let f = where_fragment(filter_criteria(&json!({})).unwrap(), &filters).unwrap();
        assert_eq!(splice("SELECT * FROM jobs", &f, "ORDER BY title"), "SELECT * FROM jobs ORDER BY title");

        let f = where_fragment(filter_criteria(&Value::Null).unwrap(), &filters).unwrap();
        assert!(f.is_empty());
    }

    #[test]
    fn splice_inserts_clause() {
        let filters = CriterionMap::new().comparison("title", "title ILIKE");
        let criteria = json!({"title": "eng"});
        let f = where_fragment(filter_criteria(&criteria).unwrap(), &filters).unwrap();
        assert_eq!(
            splice("SELECT * FROM jobs", &f, "ORDER BY title"),
            "SELECT * FROM jobs WHERE title ILIKE CONCAT('%', $1::text, '%') ORDER BY title"
        );
    }

    #[test]
    fn int_criterion_accepts_numbers_and_numeric_strings() {
        let criteria = json!({"a": 5, "b": "7", "c": "x", "d": true});
        let map = criteria.as_object().unwrap();
        assert_eq!(int_criterion(map, "a").unwrap(), Some(5));
        assert_eq!(int_criterion(map, "b").unwrap(), Some(7));
        assert_eq!(int_criterion(map, "missing").unwrap(), None);
        assert!(int_criterion(map, "c").is_err());
        assert!(int_criterion(map, "d").is_err());
    }

    #[test]
    fn int_criterion_rejects_values_beyond_integer_columns() {
        let criteria = json!({"a": 9_999_999_999_i64, "b": "3000000000", "c": -5});
        let map = criteria.as_object().unwrap();
        assert!(matches!(int_criterion(map, "a"), Err(JoblyError::BadRequest(_))));
        assert!(matches!(int_criterion(map, "b"), Err(JoblyError::BadRequest(_))));
        assert_eq!(int_criterion(map, "c").unwrap(), Some(-5));
    }

    #[test]
    fn flags_on_comparison_filters_are_bad_requests() {
        let filters = CriterionMap::new()
            .comparison("title", "title ILIKE")
            .comparison("minSalary", "salary >=")
            .presence("hasEquity", "equity > 0");

        for criteria in [
            json!({"title": "true"}),
            json!({"minSalary": true}),
            json!({"title": "eng", "minSalary": false}),
        ] {
            let err = where_fragment(filter_criteria(&criteria).unwrap(), &filters).unwrap_err();
            assert!(matches!(err, JoblyError::BadRequest(_)), "{criteria}");
        }

        let criteria = json!({"title": "eng", "hasEquity": true});
        let f = where_fragment(filter_criteria(&criteria).unwrap(), &filters).unwrap();
        assert_eq!(
            f.clause,
            "WHERE title ILIKE CONCAT('%', $1::text, '%') AND equity > 0"
        );
    }
}
