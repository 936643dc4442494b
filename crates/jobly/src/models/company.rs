use super::{filter_criteria, int_criterion, splice, updatable_fields, where_fragment};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::models::job::Job;
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::sql_fragment::{CriterionMap, FieldMap, set_clause};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_postgres::Row;

const COLUMNS: &str = "handle, name, description, num_employees, logo_url";

const UPDATABLE: &[&str] = &["name", "description", "numEmployees", "logoUrl"];

fn company_fields() -> FieldMap {
    FieldMap::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")])
}

fn company_filters() -> CriterionMap {
    CriterionMap::new()
        .comparison("name", "name ILIKE")
        .comparison("minEmployees", "num_employees >=")
        .comparison("maxEmployees", "num_employees <=")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A company with the jobs it posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Company {
    /// Insert a company.
    ///
    /// Fails with `BadRequest` when the handle is taken.
    pub async fn create(conn: &impl GenericClient, new: NewCompany) -> JoblyResult<Company> {
        let duplicate = query("SELECT handle FROM companies WHERE handle = $1")
            .tag("companies.create.check")
            .bind(new.handle.clone())
            .fetch_opt(conn)
            .await?;
        if duplicate.is_some() {
            return Err(JoblyError::bad_request(format!(
                "Duplicate company: {}",
                new.handle
            )));
        }

        let handle = new.handle.clone();
        let res = query(format!(
            "INSERT INTO companies ({COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .tag("companies.create")
        .bind(new.handle)
        .bind(new.name)
        .bind(new.description)
        .bind(new.num_employees)
        .bind(new.logo_url)
        .fetch_one_as(conn)
        .await;

        // A concurrent insert of the handle, or a taken name.
        match res {
            Err(JoblyError::UniqueViolation(_)) => {
                Err(JoblyError::bad_request(format!("Duplicate company: {handle}")))
            }
            other => other,
        }
    }

    /// List companies ordered by name.
    ///
    /// `filters` may hold `name` (case-insensitive substring), `minEmployees`
    /// and `maxEmployees`; other keys are ignored. `null` or `{}` lists all.
    pub async fn find_all(conn: &impl GenericClient, filters: &Value) -> JoblyResult<Vec<Company>> {
        let criteria = filter_criteria(filters)?;
        if let Some(criteria) = criteria {
            let min = int_criterion(criteria, "minEmployees")?;
            let max = int_criterion(criteria, "maxEmployees")?;
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(JoblyError::bad_request(
                        "minEmployees cannot be greater than maxEmployees",
                    ));
                }
            }
        }

        let filter = where_fragment(criteria, &company_filters())?;
        let sql = splice(
            &format!("SELECT {COLUMNS} FROM companies"),
            &filter,
            "ORDER BY name",
        );
        query(sql)
            .tag("companies.find_all")
            .bind_fragment(filter)
            .fetch_all_as(conn)
            .await
    }

    /// Fetch a company with its jobs.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let company: Company = query(format!("SELECT {COLUMNS} FROM companies WHERE handle = $1"))
            .tag("companies.get")
            .bind(handle.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;

        let jobs = query(
            "SELECT id, title, salary, equity, company_handle FROM jobs \
             WHERE company_handle = $1 ORDER BY id",
        )
        .tag("companies.get.jobs")
        .bind(handle.to_string())
        .fetch_all_as(conn)
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Partially update a company.
    ///
    /// `data` may change `name`, `description`, `numEmployees` and `logoUrl`.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        data: &Value,
    ) -> JoblyResult<Company> {
        let data = updatable_fields(data, UPDATABLE)?;
        let set = set_clause(data, &company_fields())?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {COLUMNS}",
            set.clause,
            set.next_placeholder()
        );

        query(sql)
            .tag("companies.update")
            .bind_fragment(set)
            .bind(handle.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))
    }

    /// Delete a company (its jobs go with it).
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        let deleted = query("DELETE FROM companies WHERE handle = $1")
            .tag("companies.remove")
            .bind(handle.to_string())
            .execute(conn)
            .await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No company: {handle}")));
        }
        Ok(())
    }
}
