//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::time::Duration;

use serde::Deserialize;

/// Where accounts, cards and the ledger live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through `DATABASE_URL`
    #[default]
    Postgres,

    /// In-process store preloaded with the demo accounts; lost on restart
    Memory,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `STORAGE` (optional): `postgres` or `memory`, defaults to `postgres`
/// - `DATABASE_URL` (required for `postgres`): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `LOCK_TIMEOUT_MS` (optional): how long a unit of work waits for an
///   account lock, at least 1, defaults to 3000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageBackend,

    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_lock_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL is required when STORAGE=postgres")]
    MissingDatabaseUrl,

    /// PostgreSQL reads a zero `lock_timeout` as "wait forever".
    #[error("LOCK_TIMEOUT_MS must be at least 1")]
    ZeroLockTimeout,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - `STORAGE=postgres` and `DATABASE_URL` is missing
    /// - `LOCK_TIMEOUT_MS` is 0
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_iter::<_, Config>(vars)?;

        if config.storage == StorageBackend::Postgres && config.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if config.lock_timeout_ms == 0 {
            return Err(ConfigError::ZeroLockTimeout);
        }

        Ok(config)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_with_database_url() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/bank")])).unwrap();

        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.lock_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn postgres_without_database_url_is_rejected() {
        let err = Config::from_vars(vars(&[("SERVER_PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let config = Config::from_vars(vars(&[
            ("STORAGE", "memory"),
            ("LOCK_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.database_url, None);
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn zero_lock_timeout_is_rejected() {
        let err = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("LOCK_TIMEOUT_MS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroLockTimeout));

        let err = Config::from_vars(vars(&[("STORAGE", "memory"), ("LOCK_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroLockTimeout));
    }

    #[test]
    fn unknown_backend_is_an_env_error() {
        let err = Config::from_vars(vars(&[("STORAGE", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env(_)));
    }
}
