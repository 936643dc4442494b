use super::updatable_fields;
use crate::auth::PasswordHasher;
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::sql_fragment::{FieldMap, set_clause};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_postgres::Row;

const COLUMNS: &str = "username, first_name, last_name, email, is_admin";

const UPDATABLE: &[&str] = &["firstName", "lastName", "password", "email", "isAdmin"];

fn user_fields() -> FieldMap {
    FieldMap::new(&[
        ("firstName", "first_name"),
        ("lastName", "last_name"),
        ("isAdmin", "is_admin"),
    ])
}

/// A user as exposed to callers; the password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl FromRow for User {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            username: row.try_get_column("username")?,
            first_name: row.try_get_column("first_name")?,
            last_name: row.try_get_column("last_name")?,
            email: row.try_get_column("email")?,
            is_admin: row.try_get_column("is_admin")?,
        })
    }
}

/// A user with the ids of the jobs they applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub applications: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub async fn authenticate(
        conn: &impl GenericClient,
        username: &str,
        password: &str,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        let row = query(format!("SELECT {COLUMNS}, password FROM users WHERE username = $1"))
            .tag("users.authenticate")
            .bind(username.to_string())
            .fetch_opt(conn)
            .await?;

        if let Some(row) = row {
            let hash: String = row.try_get_column("password")?;
            if hasher.verify(password, &hash)? {
                return User::from_row(&row);
            }
        }
        tracing::debug!(target: "jobly.auth", username, "failed login");
        Err(JoblyError::unauthorized("Invalid username/password"))
    }

    /// Create a user with a hashed password.
    pub async fn register(
        conn: &impl GenericClient,
        new: NewUser,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        let duplicate = query("SELECT username FROM users WHERE username = $1")
            .tag("users.register.check")
            .bind(new.username.clone())
            .fetch_opt(conn)
            .await?;
        if duplicate.is_some() {
            return Err(JoblyError::bad_request(format!(
                "Duplicate username: {}",
                new.username
            )));
        }

        let hashed = hasher.hash(&new.password)?;
        let username = new.username.clone();
        let res = query(format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        ))
        .tag("users.register")
        .bind(new.username)
        .bind(hashed)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.is_admin)
        .fetch_one_as(conn)
        .await;

        match res {
            Err(JoblyError::UniqueViolation(_)) => {
                Err(JoblyError::bad_request(format!("Duplicate username: {username}")))
            }
            other => other,
        }
    }

    /// List users ordered by username.
    pub async fn find_all(conn: &impl GenericClient) -> JoblyResult<Vec<User>> {
        query(format!("SELECT {COLUMNS} FROM users ORDER BY username"))
            .tag("users.find_all")
            .fetch_all_as(conn)
            .await
    }

    /// Fetch a user with their applications.
    pub async fn get(conn: &impl GenericClient, username: &str) -> JoblyResult<UserDetail> {
        let user: User = query(format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
            .tag("users.get")
            .bind(username.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))?;

        let rows = query("SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id")
            .tag("users.get.applications")
            .bind(username.to_string())
            .fetch_all(conn)
            .await?;
        let applications = rows
            .iter()
            .map(|row| row.try_get_column("job_id"))
            .collect::<JoblyResult<Vec<i32>>>()?;

        Ok(UserDetail { user, applications })
    }

    /// Partially update a user.
    ///
    /// A new `password` is hashed before it is stored.
    pub async fn update(
        conn: &impl GenericClient,
        username: &str,
        data: &Value,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        let mut data = updatable_fields(data, UPDATABLE)?.clone();
        if let Some(password) = data.get_mut("password") {
            let Value::String(plain) = password else {
                return Err(JoblyError::bad_request("password must be a string"));
            };
            let hashed = hasher.hash(plain)?;
            *password = Value::String(hashed);
        }

        let set = set_clause(&data, &user_fields())?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {COLUMNS}",
            set.clause,
            set.next_placeholder()
        );

        query(sql)
            .tag("users.update")
            .bind_fragment(set)
            .bind(username.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))
    }

    pub async fn remove(conn: &impl GenericClient, username: &str) -> JoblyResult<()> {
        let deleted = query("DELETE FROM users WHERE username = $1")
            .tag("users.remove")
            .bind(username.to_string())
            .execute(conn)
            .await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No user: {username}")));
        }
        Ok(())
    }

    /// Record an application from `username` to job `job_id`.
    pub async fn apply_to_job(
        conn: &impl GenericClient,
        username: &str,
        job_id: i32,
    ) -> JoblyResult<()> {
        query("SELECT id FROM jobs WHERE id = $1")
            .tag("users.apply.job")
            .bind(job_id)
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {job_id}")))?;

        query("SELECT username FROM users WHERE username = $1")
            .tag("users.apply.user")
            .bind(username.to_string())
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))?;

        let res = query("INSERT INTO applications (job_id, username) VALUES ($1, $2)")
            .tag("users.apply")
            .bind(job_id)
            .bind(username.to_string())
            .execute(conn)
            .await;

        match res {
            Ok(_) => Ok(()),
            Err(JoblyError::UniqueViolation(_)) => Err(JoblyError::bad_request(format!(
                "{username} already applied to job {job_id}"
            ))),
            Err(e) => Err(e),
        }
    }
}
