//! Connection setup.

use crate::error::{JoblyError, JoblyResult};
use tokio_postgres::NoTls;

/// Open a single connection and drive it on the current tokio runtime.
///
/// # Example
///
/// ```ignore
/// let client = jobly::db::connect(&config.database_url).await?;
/// let companies = Company::find_all(&client, &serde_json::Value::Null).await?;
/// ```
pub async fn connect(database_url: &str) -> JoblyResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(|e| JoblyError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "jobly.db", error = %e, "postgres connection error");
        }
    });
    Ok(client)
}

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_size};

#[cfg(feature = "pool")]
mod pool {
    use super::*;
    use crate::config::AppConfig;
    use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};

    const DEFAULT_POOL_SIZE: usize = 16;

    /// Create a connection pool for the configured database.
    pub fn create_pool(config: &AppConfig) -> JoblyResult<Pool> {
        create_pool_with_size(&config.database_url, DEFAULT_POOL_SIZE)
    }

    /// Create a connection pool with an explicit maximum size.
    pub fn create_pool_with_size(database_url: &str, max_size: usize) -> JoblyResult<Pool> {
        let pg_config: tokio_postgres::Config = database_url
            .parse()
            .map_err(|e: tokio_postgres::Error| JoblyError::Connection(e.to_string()))?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, manager_config);
        Pool::builder(mgr)
            .max_size(max_size)
            .build()
            .map_err(|e| JoblyError::Pool(e.to_string()))
    }

}
