//! Lightweight query builder for hand-written SQL

use crate::client::GenericClient;
use crate::error::JoblyResult;
use crate::row::FromRow;
use crate::sql_fragment::Fragment;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Longest SQL text emitted in debug logs, in bytes.
const MAX_LOGGED_SQL: usize = 200;

/// A lightweight query builder for executing hand-written SQL with parameter binding.
///
/// Parameters are bound in the order they are added, so a statement that
/// splices a [`Fragment`] binds the fragment first and then its own trailing
/// parameters starting at [`Fragment::next_placeholder`].
///
/// # Example
///
/// ```ignore
/// use jobly::query;
///
/// let company: Company = query("SELECT * FROM companies WHERE handle = $1")
///     .tag("companies.get")
///     .bind("c1")
///     .fetch_one_as(&conn)
///     .await?;
/// ```
pub struct Query {
    sql: String,
    params: Vec<Box<dyn ToSql + Sync + Send>>,
    tag: Option<&'static str>,
}

/// Create a new query with the given SQL
pub fn query(sql: impl Into<String>) -> Query {
    Query {
        sql: sql.into(),
        params: Vec::new(),
        tag: None,
    }
}

impl Query {
    /// Associate a tag for log correlation.
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Bind a parameter to the query
    pub fn bind<T: ToSql + Sync + Send + 'static>(mut self, value: T) -> Self {
        self.params.push(Box::new(value));
        self
    }

    /// Bind every value of a fragment, in placeholder order.
    pub fn bind_fragment(mut self, fragment: Fragment) -> Self {
        for value in fragment.values {
            self.params.push(Box::new(value));
        }
        self
    }

    /// The SQL text as it will be sent.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of bound parameters.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.trace();
        self.params.iter().map(|p| p.as_ref() as _).collect()
    }

    fn trace(&self) {
        let sql = truncate_sql_bytes(&self.sql, MAX_LOGGED_SQL);
        tracing::debug!(
            target: "jobly.sql",
            tag = self.tag.unwrap_or("-"),
            param_count = self.params.len(),
            sql = %sql,
            "query"
        );
    }

    /// Execute the query and return all rows
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        let params = self.params_ref();
        conn.query(&self.sql, &params).await
    }

    /// Execute the query and return all rows mapped to type T
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the query and return exactly one row
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> JoblyResult<Row> {
        let params = self.params_ref();
        conn.query_one(&self.sql, &params).await
    }

    /// Execute the query and return exactly one row mapped to type T
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute the query and return at most one row
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> JoblyResult<Option<Row>> {
        let params = self.params_ref();
        conn.query_opt(&self.sql, &params).await
    }

    /// Execute the query and return at most one row mapped to type T
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the query and return the number of affected rows
    pub async fn execute(&self, conn: &impl GenericClient) -> JoblyResult<u64> {
        let params = self.params_ref();
        conn.execute(&self.sql, &params).await
    }
}

/// Cut `sql` to at most `max` bytes without splitting a character.
fn truncate_sql_bytes(sql: &str, max: usize) -> std::borrow::Cow<'_, str> {
    if sql.len() <= max {
        return sql.into();
    }
    let mut end = max;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end]).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_fragment::{FieldMap, build_set_clause};
    use serde_json::json;

    #[test]
    fn fragment_values_bind_before_trailing_params() {
        let set = build_set_clause(&json!({"title": "New", "salary": 100}), &FieldMap::empty())
            .unwrap();
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${}",
            set.clause,
            set.next_placeholder()
        );
        let q = query(sql).bind_fragment(set).bind(7_i32);

        assert_eq!(q.sql(), r#"UPDATE jobs SET "title"=$1, "salary"=$2 WHERE id = $3"#);
        assert_eq!(q.param_count(), 3);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 200), "SELECT 1");
        assert_eq!(truncate_sql_bytes("ééé", 3), "é...");
    }
}
