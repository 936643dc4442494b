//! Application configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first (if present), so
//! local development can keep settings out of the shell.

use crate::error::{JoblyError, JoblyResult};
use std::str::FromStr;

const DEFAULT_SECRET_KEY: &str = "secret-dev";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "postgresql:///jobly";
const TEST_DATABASE_URL: &str = "postgresql:///jobly_test";
const DEFAULT_BCRYPT_WORK_FACTOR: u32 = 12;
// Keep test runs fast.
const TEST_BCRYPT_WORK_FACTOR: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Key the token verifier signs and checks with.
    pub secret_key: String,
    pub port: u16,
    pub database_url: String,
    /// Cost handed to the password hasher.
    pub bcrypt_work_factor: u32,
    /// Set when `RUN_MODE=test`.
    pub test_mode: bool,
}

impl AppConfig {
    /// Load from process environment after reading `.env`.
    pub fn from_env() -> JoblyResult<Self> {
        // A missing .env file is normal outside development.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(JoblyError::Config(format!("failed to read .env: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<Self> {
        let test_mode = lookup("RUN_MODE").is_some_and(|mode| mode == "test");

        let secret_key = lookup("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());
        let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None if test_mode => TEST_DATABASE_URL.to_string(),
            None => DEFAULT_DATABASE_URL.to_string(),
        };
        let bcrypt_work_factor = match parse_var(&lookup, "BCRYPT_WORK_FACTOR")? {
            Some(factor) => factor,
            None if test_mode => TEST_BCRYPT_WORK_FACTOR,
            None => DEFAULT_BCRYPT_WORK_FACTOR,
        };

        if secret_key.is_empty() {
            return Err(JoblyError::Config("SECRET_KEY must not be empty".to_string()));
        }

        let config = Self {
            secret_key,
            port,
            database_url,
            bcrypt_work_factor,
            test_mode,
        };
        tracing::debug!(
            target: "jobly.config",
            port = config.port,
            bcrypt_work_factor = config.bcrypt_work_factor,
            test_mode = config.test_mode,
            "loaded configuration"
        );
        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> JoblyResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| JoblyError::Config(format!("invalid {key} {raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.secret_key, "secret-dev");
        assert_eq!(config.port, 3001);
        assert_eq!(config.database_url, "postgresql:///jobly");
        assert_eq!(config.bcrypt_work_factor, 12);
        assert!(!config.test_mode);
    }

    #[test]
    fn test_mode_switches_database_and_work_factor() {
        let config = AppConfig::from_lookup(lookup_from(&[("RUN_MODE", "test")])).unwrap();
        assert_eq!(config.database_url, "postgresql:///jobly_test");
        assert_eq!(config.bcrypt_work_factor, 1);
        assert!(config.test_mode);
    }

    #[test]
    fn explicit_variables_win() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("RUN_MODE", "test"),
            ("SECRET_KEY", "abc"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://db/jobs"),
            ("BCRYPT_WORK_FACTOR", "4"),
        ]))
        .unwrap();
        assert_eq!(config.secret_key, "abc");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "postgres://db/jobs");
        assert_eq!(config.bcrypt_work_factor, 4);
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, JoblyError::Config(_)));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("SECRET_KEY", "")])).unwrap_err();
        assert!(matches!(err, JoblyError::Config(_)));
    }
}
