//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AuthConfig, TableStorageConfig};
use crate::store::{AzureTable, CredentialStore, StoreError};

/// TCP connect timeout for the table service client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: CredentialStore,
    admin_table: String,
    users_table: String,
}

impl AppState {
    /// Create state over an already-built credential store.
    #[must_use]
    pub fn new(
        store: CredentialStore,
        admin_table: impl Into<String>,
        users_table: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                admin_table: admin_table.into(),
                users_table: users_table.into(),
            }),
        }
    }

    /// Build state backed by Azure Table Storage.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the HTTP client cannot be built or the account
    /// key cannot be decoded.
    pub fn from_config(config: &AuthConfig) -> Result<Self, StoreError> {
        let store = connect(&config.storage)?;
        Ok(Self::new(
            store,
            &config.storage.admin_table,
            &config.storage.users_table,
        ))
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Name of the admin table.
    #[must_use]
    pub fn admin_table(&self) -> &str {
        &self.inner.admin_table
    }

    /// Name of the users table.
    #[must_use]
    pub fn users_table(&self) -> &str {
        &self.inner.users_table
    }
}

/// Build a credential store over the two configured Azure tables.
///
/// # Errors
///
/// Returns `StoreError` if the HTTP client cannot be built or the account
/// key cannot be decoded.
pub fn connect(storage: &TableStorageConfig) -> Result<CredentialStore, StoreError> {
    let conn = &storage.connection;
    let admins = AzureTable::new(conn, &storage.admin_table, CONNECT_TIMEOUT)?;
    // Both tables share one connection pool.
    let users = AzureTable::with_client(
        admins.client().clone(),
        conn,
        &storage.users_table,
        conn.decoded_key()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?,
    );
    Ok(CredentialStore::new(
        Arc::new(admins),
        Arc::new(users),
        storage.timeout,
    ))
}
