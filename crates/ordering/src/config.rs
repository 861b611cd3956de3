//! Ordering configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `DINEEASE_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `DINEEASE_DB_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 10)
//! - `DINEEASE_TOP_ITEMS` - Best sellers shown on the dashboard (default: 5)
//! - `DINEEASE_SITE_NAME` - Site name used in output (default: DineEase)
//! - `DINEEASE_FACE_MODEL` - Path to the `SeetaFace` detection model used for
//!   table-side ratings (no default)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Database pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub url: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long to wait for a free connection
    pub acquire_timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct OrderingConfig {
    /// Database settings
    pub database: DatabaseConfig,
    /// Number of best sellers on the owner dashboard
    pub top_items: usize,
    /// Site name
    pub site_name: String,
    /// Face detection model file, if configured
    pub face_model: Option<PathBuf>,
}

impl OrderingConfig {
    /// Load configuration from the process environment.
    ///
    /// Callers load `.env` first (the CLI does this with `dotenvy`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Same as [`OrderingConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let max_connections = parse_or_default(&lookup, "DINEEASE_DB_MAX_CONNECTIONS", 10_u32)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "DINEEASE_DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let acquire_timeout_secs =
            parse_or_default(&lookup, "DINEEASE_DB_ACQUIRE_TIMEOUT_SECS", 10_u64)?;
        let top_items = parse_or_default(&lookup, "DINEEASE_TOP_ITEMS", 5_usize)?;
        let site_name = lookup("DINEEASE_SITE_NAME").unwrap_or_else(|| "DineEase".to_string());
        let face_model = lookup("DINEEASE_FACE_MODEL")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            top_items,
            site_name,
            face_model,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            OrderingConfig::from_lookup(env(&[("DATABASE_URL", "postgres://localhost/dineease")]))
                .unwrap();
        assert_eq!(config.database.url.expose_secret(), "postgres://localhost/dineease");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(10));
        assert_eq!(config.top_items, 5);
        assert_eq!(config.site_name, "DineEase");
        assert_eq!(config.face_model, None);
    }

    #[test]
    fn test_face_model_path() {
        let config = OrderingConfig::from_lookup(env(&[
            ("DATABASE_URL", "postgres://localhost/dineease"),
            ("DINEEASE_FACE_MODEL", "/opt/models/seeta_fd_frontal_v1.0.bin"),
        ]))
        .unwrap();
        assert_eq!(
            config.face_model,
            Some(PathBuf::from("/opt/models/seeta_fd_frontal_v1.0.bin"))
        );
    }

    #[test]
    fn test_missing_database_url() {
        let err = OrderingConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "DATABASE_URL"));
    }

    #[test]
    fn test_invalid_number() {
        let err = OrderingConfig::from_lookup(env(&[
            ("DATABASE_URL", "postgres://localhost/dineease"),
            ("DINEEASE_TOP_ITEMS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "DINEEASE_TOP_ITEMS"));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let err = OrderingConfig::from_lookup(env(&[
            ("DATABASE_URL", "postgres://localhost/dineease"),
            ("DINEEASE_DB_MAX_CONNECTIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_debug_redacts_url() {
        let config =
            OrderingConfig::from_lookup(env(&[("DATABASE_URL", "postgres://user:hunter2@db/x")]))
                .unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
