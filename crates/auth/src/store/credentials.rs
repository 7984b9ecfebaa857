//! Credential store adapter over the admin and users tables.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use agentbridge_core::{AccountKind, Email};

use super::{AccountRecord, AccountTable, StoreError};

/// Reachability of both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHealth {
    /// The admin table answered a ping.
    pub admin_reachable: bool,
    /// The users table answered a ping.
    pub users_reachable: bool,
}

impl StoreHealth {
    /// Returns `true` when both tables are reachable.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.admin_reachable && self.users_reachable
    }
}

/// Access to both account tables.
///
/// Cheap to clone; the tables are shared behind `Arc`. Every call is bounded
/// by `timeout`, and an expired call is reported as [`StoreError::Timeout`].
#[derive(Clone)]
pub struct CredentialStore {
    admins: Arc<dyn AccountTable>,
    users: Arc<dyn AccountTable>,
    timeout: Duration,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("admins", &self.admins.name())
            .field("users", &self.users.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CredentialStore {
    /// Create a store over the given admin and users tables.
    #[must_use]
    pub fn new(
        admins: Arc<dyn AccountTable>,
        users: Arc<dyn AccountTable>,
        timeout: Duration,
    ) -> Self {
        Self {
            admins,
            users,
            timeout,
        }
    }

    fn table(&self, kind: AccountKind) -> &dyn AccountTable {
        match kind {
            AccountKind::Admin => self.admins.as_ref(),
            AccountKind::User => self.users.as_ref(),
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    /// Fetch the record for `email` from the `kind` table.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no such record exists, or another
    /// `StoreError` if the table call failed.
    #[instrument(skip(self, email))]
    pub async fn get(&self, kind: AccountKind, email: &Email) -> Result<AccountRecord, StoreError> {
        self.bounded(self.table(kind).get(email.as_str())).await
    }

    /// List every record in the `kind` table.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the table call failed.
    #[instrument(skip(self))]
    pub async fn list(&self, kind: AccountKind) -> Result<Vec<AccountRecord>, StoreError> {
        let records = self.bounded(self.table(kind).list()).await?;
        debug!(count = records.len(), "listed accounts");
        Ok(records)
    }

    /// Create a record in the `kind` table.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the email is taken in that
    /// table, or another `StoreError` if the table call failed.
    #[instrument(skip(self, email, digest))]
    pub async fn create(
        &self,
        kind: AccountKind,
        email: &Email,
        digest: &str,
    ) -> Result<AccountRecord, StoreError> {
        let record = AccountRecord::new(email.as_str(), digest, Utc::now());
        self.bounded(self.table(kind).insert(&record)).await?;
        Ok(record)
    }

    /// Replace the digest of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the record is absent, or another
    /// `StoreError` if the table call failed.
    #[instrument(skip(self, email, digest))]
    pub async fn update_password(
        &self,
        kind: AccountKind,
        email: &Email,
        digest: &str,
    ) -> Result<(), StoreError> {
        self.bounded(
            self.table(kind)
                .update_password(email.as_str(), digest, Utc::now()),
        )
        .await
    }

    /// Set the digest of a record, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the table call failed.
    #[instrument(skip(self, email, digest))]
    pub async fn upsert(
        &self,
        kind: AccountKind,
        email: &Email,
        digest: &str,
    ) -> Result<(), StoreError> {
        self.bounded(
            self.table(kind)
                .upsert_password(email.as_str(), digest, Utc::now()),
        )
        .await
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the record is absent, or another
    /// `StoreError` if the table call failed.
    #[instrument(skip(self, email))]
    pub async fn delete(&self, kind: AccountKind, email: &Email) -> Result<(), StoreError> {
        self.bounded(self.table(kind).delete(email.as_str())).await
    }

    /// Whether the `kind` table currently answers.
    pub async fn is_reachable(&self, kind: AccountKind) -> bool {
        match self.bounded(self.table(kind).ping()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(table = self.table(kind).name(), error = %e, "table ping failed");
                false
            }
        }
    }

    /// Ping both tables concurrently.
    pub async fn health(&self) -> StoreHealth {
        let (admin_reachable, users_reachable) = tokio::join!(
            self.is_reachable(AccountKind::Admin),
            self.is_reachable(AccountKind::User)
        );
        StoreHealth {
            admin_reachable,
            users_reachable,
        }
    }
}
