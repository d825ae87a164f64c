use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {0} must not be empty")]
    Empty(&'static str),
    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub jwt_secret: String,
    pub listen_addr: String,
    pub cors_origin: String,
    pub db_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the environment, after loading `.env` if present.
    pub fn init() -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::Missing(name))?;
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
            Ok(value)
        };

        let db_timeout = match lookup("DB_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "DB_TIMEOUT_SECS",
                    value,
                })?,
            None => Duration::from_secs(5),
        };

        Ok(Config {
            db_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            cors_origin: lookup("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            db_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.db_timeout, Duration::from_secs(5));
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn missing_secret_is_a_startup_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/bank")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn empty_secret_is_a_startup_error() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("JWT_SECRET", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Empty("JWT_SECRET")));
    }

    #[test]
    fn bad_timeout_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("JWT_SECRET", "s3cret"),
            ("DB_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_TIMEOUT_SECS", .. }));
    }
}
