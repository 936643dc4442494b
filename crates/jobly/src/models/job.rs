use super::{filter_criteria, int_criterion, splice, updatable_fields, where_fragment};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::models::company::Company;
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::sql_fragment::{CriterionMap, FieldMap, set_clause};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_postgres::Row;

const COLUMNS: &str = "id, title, salary, equity, company_handle";

// The owning company and id are fixed once posted.
const UPDATABLE: &[&str] = &["title", "salary", "equity"];

fn job_filters() -> CriterionMap {
    CriterionMap::new()
        .comparison("title", "title ILIKE")
        .comparison("minSalary", "salary >=")
        .presence("hasEquity", "equity > 0")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// A job with the company posting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub company: Company,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl Job {
    /// Insert a job for an existing company.
    pub async fn create(conn: &impl GenericClient, new: NewJob) -> JoblyResult<Job> {
        let handle = new.company_handle.clone();
        let res = query(format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .tag("jobs.create")
        .bind(new.title)
        .bind(new.salary)
        .bind(new.equity)
        .bind(new.company_handle)
        .fetch_one_as(conn)
        .await;

        match res {
            Err(JoblyError::ForeignKeyViolation(_)) => {
                Err(JoblyError::bad_request(format!("No company: {handle}")))
            }
            other => other,
        }
    }

    /// List jobs ordered by title.
    ///
    /// `filters` may hold `title` (case-insensitive substring), `minSalary`
    /// and `hasEquity`; `hasEquity: false` does not filter at all.
    pub async fn find_all(conn: &impl GenericClient, filters: &Value) -> JoblyResult<Vec<Job>> {
        let criteria = filter_criteria(filters)?;
        if let Some(criteria) = criteria {
            int_criterion(criteria, "minSalary")?;
        }

        let filter = where_fragment(criteria, &job_filters())?;
        let sql = splice(
            &format!("SELECT {COLUMNS} FROM jobs"),
            &filter,
            "ORDER BY title, id",
        );
        query(sql)
            .tag("jobs.find_all")
            .bind_fragment(filter)
            .fetch_all_as(conn)
            .await
    }

    /// Fetch a job with its company.
    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<JobDetail> {
        let job: Job = query(format!("SELECT {COLUMNS} FROM jobs WHERE id = $1"))
            .tag("jobs.get")
            .bind(id)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))?;

        let company = query(
            "SELECT handle, name, description, num_employees, logo_url \
             FROM companies WHERE handle = $1",
        )
        .tag("jobs.get.company")
        .bind(job.company_handle.clone())
        .fetch_one_as(conn)
        .await?;

        Ok(JobDetail { job, company })
    }

    /// Partially update a job's `title`, `salary` or `equity`.
    pub async fn update(conn: &impl GenericClient, id: i32, data: &Value) -> JoblyResult<Job> {
        let data = updatable_fields(data, UPDATABLE)?;
        let set = set_clause(data, &FieldMap::empty())?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {COLUMNS}",
            set.clause,
            set.next_placeholder()
        );

        query(sql)
            .tag("jobs.update")
            .bind_fragment(set)
            .bind(id)
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))
    }

    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        let deleted = query("DELETE FROM jobs WHERE id = $1")
            .tag("jobs.remove")
            .bind(id)
            .execute(conn)
            .await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No job: {id}")));
        }
        Ok(())
    }
}
