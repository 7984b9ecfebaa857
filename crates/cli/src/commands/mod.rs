//! CLI command implementations.

pub mod admin;
pub mod user;

use agentbridge_auth::config::{ConfigError, TableStorageConfig};
use agentbridge_auth::services::UserError;
use agentbridge_auth::state;
use agentbridge_auth::store::{CredentialStore, StoreError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Table client could not be built.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Account operation failed.
    #[error("{0}")]
    Account(#[from] UserError),

    /// One or both tables did not answer.
    #[error("Account tables unreachable (admin: {admin}, users: {users})")]
    Unhealthy { admin: bool, users: bool },
}

/// Build a credential store from the environment.
///
/// # Errors
///
/// Returns `CommandError` if configuration is invalid or the clients cannot be built.
pub fn connect() -> Result<CredentialStore, CommandError> {
    let storage = TableStorageConfig::from_env()?;
    tracing::debug!(
        admin_table = %storage.admin_table,
        users_table = %storage.users_table,
        "connecting to account tables"
    );
    Ok(state::connect(&storage)?)
}

/// Ping both tables.
///
/// # Errors
///
/// Returns `CommandError::Unhealthy` unless both tables answer.
pub async fn health(store: &CredentialStore) -> Result<(), CommandError> {
    let health = store.health().await;
    if !health.is_healthy() {
        return Err(CommandError::Unhealthy {
            admin: health.admin_reachable,
            users: health.users_reachable,
        });
    }
    tracing::info!("Both account tables are reachable");
    Ok(())
}
