//! Auth service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AZURE_TABLE_CONN_STRING` - Storage account connection string
//! - `ADMIN_AZURE_TABLE_NAME` - Table holding admin accounts
//! - `USERS_AZURE_TABLE_NAME` - Table holding user accounts
//!
//! ## Optional
//! - `AUTH_HOST` - Bind address (default: 127.0.0.1)
//! - `AUTH_PORT` - Listen port (default: 8000)
//! - `STORE_TIMEOUT_SECS` - Per-call table timeout (default: 10)
//! - `STATIC_DIR` - Directory of frontend assets to serve
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origin allowlist (default: any)
//! - `LOG_FORMAT` - `json` for JSON logs (default: human-readable)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::store::{ConnectionString, ConnectionStringError};

const MIN_TABLE_NAME_LENGTH: usize = 3;
const MAX_TABLE_NAME_LENGTH: usize = 63;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid AZURE_TABLE_CONN_STRING: {0}")]
    ConnectionString(#[from] ConnectionStringError),
}

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Account table storage
    pub storage: TableStorageConfig,
    /// Frontend assets served for unmatched paths
    pub static_dir: Option<PathBuf>,
    /// Allowed CORS origins; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Emit JSON logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Account table storage configuration.
///
/// The connection string's `Debug` redacts the account key.
#[derive(Debug, Clone)]
pub struct TableStorageConfig {
    /// Parsed storage account connection string
    pub connection: ConnectionString,
    /// Admin account table name
    pub admin_table: String,
    /// User account table name
    pub users_table: String,
    /// Per-call timeout for table operations
    pub timeout: Duration,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get_env_or_default(&get, "AUTH_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("AUTH_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(&get, "AUTH_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("AUTH_PORT".to_string(), e.to_string()))?;

        let storage = TableStorageConfig::from_lookup(&get)?;

        let static_dir = get_optional_env(&get, "STATIC_DIR").map(PathBuf::from);
        let cors_allowed_origins = get_optional_env(&get, "CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let log_json = get_optional_env(&get, "LOG_FORMAT")
            .is_some_and(|format| format.eq_ignore_ascii_case("json"));

        Ok(Self {
            host,
            port,
            storage,
            static_dir,
            cors_allowed_origins,
            log_json,
            sentry_dsn: get_optional_env(&get, "SENTRY_DSN"),
            sentry_environment: get_optional_env(&get, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TableStorageConfig {
    /// Load only the storage settings (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let connection =
            ConnectionString::parse(&get_required_env(get, "AZURE_TABLE_CONN_STRING")?)?;
        let admin_table = get_table_name(get, "ADMIN_AZURE_TABLE_NAME")?;
        let users_table = get_table_name(get, "USERS_AZURE_TABLE_NAME")?;

        let timeout_secs = get_env_or_default(get, "STORE_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "STORE_TIMEOUT_SECS".to_string(),
                    "must be a positive number of seconds".to_string(),
                )
            })?;

        Ok(Self {
            connection,
            admin_table,
            users_table,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    get(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    get(key).filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(get, key).unwrap_or_else(|| default.to_string())
}

/// Get a required table name and check it against the service's naming rules.
fn get_table_name(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    let name = get_required_env(get, key)?;
    validate_table_name(&name)
        .map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason.to_string()))?;
    Ok(name)
}

/// Table names are 3-63 alphanumeric characters and start with a letter.
fn validate_table_name(name: &str) -> Result<(), &'static str> {
    if !(MIN_TABLE_NAME_LENGTH..=MAX_TABLE_NAME_LENGTH).contains(&name.len()) {
        return Err("table name must be 3-63 characters");
    }
    if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err("table name must start with a letter");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("table name must be alphanumeric");
    }
    Ok(())
}
