//! Process-local account table.
//!
//! Used by tests and for running the server without an Azure account. The
//! table can be flipped into an unavailable state (or made to stall) to
//! exercise failure handling.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{AccountRecord, AccountTable, StoreError};

/// In-memory [`AccountTable`] keyed by email.
#[derive(Debug, Default)]
pub struct InMemoryTable {
    name: String,
    records: RwLock<BTreeMap<String, AccountRecord>>,
    unavailable: AtomicBool,
    stall: RwLock<Option<Duration>>,
}

impl InMemoryTable {
    /// Create an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `delay` before it runs.
    pub async fn set_stall(&self, delay: Option<Duration>) {
        *self.stall.write().await = delay;
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if the table holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn check(&self) -> Result<(), StoreError> {
        let stall = *self.stall.read().await;
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "table {} is offline",
                self.name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountTable for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, email: &str) -> Result<AccountRecord, StoreError> {
        self.check().await?;
        self.records
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<AccountRecord>, StoreError> {
        self.check().await?;
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn insert(&self, record: &AccountRecord) -> Result<(), StoreError> {
        self.check().await?;
        let mut records = self.records.write().await;
        if records.contains_key(&record.email) {
            return Err(StoreError::AlreadyExists);
        }
        records.insert(record.email.clone(), record.clone());
        Ok(())
    }

    async fn update_password(
        &self,
        email: &str,
        digest: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check().await?;
        let mut records = self.records.write().await;
        let record = records.get_mut(email).ok_or(StoreError::NotFound)?;
        record.password_digest = Some(digest.to_owned());
        record.updated_at = Some(updated_at);
        Ok(())
    }

    async fn upsert_password(
        &self,
        email: &str,
        digest: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check().await?;
        let mut records = self.records.write().await;
        let record = records
            .entry(email.to_owned())
            .or_insert_with(|| AccountRecord {
                email: email.to_owned(),
                password_digest: None,
                created_at: None,
                updated_at: None,
            });
        record.password_digest = Some(digest.to_owned());
        record.updated_at = Some(updated_at);
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<(), StoreError> {
        self.check().await?;
        self.records
            .write()
            .await
            .remove(email)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check().await
    }
}
