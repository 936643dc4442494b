//! # jobly
//!
//! Data layer for a job board: companies, the jobs they post, and the users
//! who apply to them, stored in PostgreSQL.
//!
//! ## Features
//!
//! - **SQL fragment builder**: turn loosely-typed update and filter payloads
//!   into parameterized `SET` / `WHERE` clauses (see [`sql_fragment`])
//! - **Transaction-friendly models**: pass a transaction anywhere a
//!   [`GenericClient`] is expected
//! - **Auth checks**: decide access from a decoded token payload
//!
//! ## Example
//!
//! ```ignore
//! use jobly::models::Job;
//! use serde_json::json;
//!
//! let client = jobly::db::connect(&config.database_url).await?;
//!
//! // WHERE title ILIKE CONCAT('%', $1::text, '%') AND equity > 0
//! let jobs = Job::find_all(&client, &json!({"title": "eng", "hasEquity": true})).await?;
//!
//! // UPDATE jobs SET "salary"=$1 WHERE id = $2
//! let job = Job::update(&client, jobs[0].id, &json!({"salary": 120000})).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod row;
pub mod sql_fragment;
pub mod value;

pub use auth::{Claims, PasswordHasher, TokenVerifier};
pub use client::GenericClient;
pub use config::AppConfig;
pub use error::{JoblyError, JoblyResult};
pub use query::{Query, query};
pub use row::{FromRow, RowExt};
pub use sql_fragment::{
    CriterionMap, FieldMap, FilterDef, Fragment, build_set_clause, build_where_clause,
};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub use db::create_pool;
