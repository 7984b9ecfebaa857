//! Account table storage.
//!
//! # Collections
//!
//! Accounts live in two independent tables that share one layout:
//!
//! - admin table - accounts allowed to use the admin login
//! - users table - regular accounts managed through the admin API
//!
//! Every record sits under the fixed partition key
//! [`PARTITION_KEY`](agentbridge_core::PARTITION_KEY) with the account email
//! as its row key. Nothing is shared between the two tables and no operation
//! spans both.
//!
//! # Backends
//!
//! - [`AzureTable`] - Azure Table Storage over its REST API
//! - [`InMemoryTable`] - process-local table for tests and local development
//!
//! Handlers never talk to a backend directly; they go through
//! [`CredentialStore`], which picks the table for an [`AccountKind`] and
//! bounds every call with a timeout.
//!
//! [`AccountKind`]: agentbridge_core::AccountKind

pub mod azure;
pub mod credentials;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

pub use azure::{AzureTable, ConnectionString, ConnectionStringError};
pub use credentials::{CredentialStore, StoreHealth};
pub use memory::InMemoryTable;

/// Errors that can occur during table operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the requested email.
    #[error("not found")]
    NotFound,

    /// A record with this email already exists.
    #[error("already exists")]
    AlreadyExists,

    /// The table service could not be reached or rejected the request.
    #[error("table service unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured timeout.
    #[error("table call timed out after {0:?}")]
    Timeout(Duration),

    /// The service returned data that could not be decoded.
    #[error("malformed table response: {0}")]
    Malformed(String),
}

/// A stored account.
///
/// Whether the account is an admin is not part of the record; it depends on
/// the table the record was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Row key (the account email, as stored).
    pub email: String,
    /// Password digest. `None` when the stored entity has no digest.
    pub password_digest: Option<String>,
    /// When the record was created (informational).
    pub created_at: Option<DateTime<Utc>>,
    /// When the digest was last replaced (informational).
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// Build a fresh record for `email` with `digest`, stamped at `now`.
    #[must_use]
    pub fn new(email: impl Into<String>, digest: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            password_digest: Some(digest.into()),
            created_at: Some(now),
            updated_at: None,
        }
    }

    /// The stored digest, treating an empty string the same as a missing one.
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        self.password_digest.as_deref().filter(|d| !d.is_empty())
    }
}

/// A single account table.
///
/// Implementations address records by row key only; the partition key is
/// fixed. All methods report a missing record as [`StoreError::NotFound`] and
/// a duplicate insert as [`StoreError::AlreadyExists`].
#[async_trait]
pub trait AccountTable: Send + Sync {
    /// Table name, for logs.
    fn name(&self) -> &str;

    /// Fetch one record.
    async fn get(&self, email: &str) -> Result<AccountRecord, StoreError>;

    /// Fetch every record in the partition.
    async fn list(&self) -> Result<Vec<AccountRecord>, StoreError>;

    /// Insert a new record. Fails with `AlreadyExists` if the row key is taken.
    async fn insert(&self, record: &AccountRecord) -> Result<(), StoreError>;

    /// Replace the digest of an existing record. Fails with `NotFound` if absent.
    async fn update_password(
        &self,
        email: &str,
        digest: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Set the digest, creating the record if it does not exist.
    async fn upsert_password(
        &self,
        email: &str,
        digest: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Delete a record. Fails with `NotFound` if absent.
    async fn delete(&self, email: &str) -> Result<(), StoreError>;

    /// Cheap round trip proving the table is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Format a timestamp the way records store it.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Older records carry naive ISO-8601 strings without an offset; those are
/// read as UTC. Anything unparseable is dropped since timestamps are
/// informational only.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
