//! Account management.
//!
//! HTTP management routes only touch the users table. Admin records are
//! managed through the CLI (`add_admin`, `set_admin_password`).

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use agentbridge_core::{AccountKind, Email, EmailError};

use super::auth::{AuthError, hash_password};
use crate::store::{AccountRecord, CredentialStore, StoreError};

/// Errors from account management.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("user not found")]
    NotFound,

    #[error("user already exists")]
    AlreadyExists,

    #[error("password hashing error")]
    PasswordHash,

    #[error("account store unavailable: {0}")]
    StoreUnavailable(StoreError),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::AlreadyExists => Self::AlreadyExists,
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<AuthError> for UserError {
    fn from(_: AuthError) -> Self {
        Self::PasswordHash
    }
}

/// Listing entry for a user account.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub email: String,
    /// Stored digest; empty when the record has none.
    pub hashed_password: String,
}

impl From<AccountRecord> for UserSummary {
    fn from(record: AccountRecord) -> Self {
        Self {
            email: record.email,
            hashed_password: record.password_digest.unwrap_or_default(),
        }
    }
}

/// Account management service.
pub struct UserService<'a> {
    store: &'a CredentialStore,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(store: &'a CredentialStore) -> Self {
        Self { store }
    }

    /// List every user account.
    ///
    /// # Errors
    ///
    /// Returns `UserError::StoreUnavailable` if the users table cannot be read.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, UserError> {
        let records = self.store.list(AccountKind::User).await?;
        Ok(records.into_iter().map(UserSummary::from).collect())
    }

    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns `UserError::AlreadyExists` if the email is taken; the existing
    /// record is left untouched.
    pub async fn add_user(&self, email: &str, password: &str) -> Result<Email, UserError> {
        self.create(AccountKind::User, email, password).await
    }

    /// Replace a user's password.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the user does not exist.
    #[instrument(skip(self, email, password))]
    pub async fn update_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Email, UserError> {
        let email = Email::parse(email)?;
        let digest = digest_for(password)?;

        self.store
            .update_password(AccountKind::User, &email, &digest)
            .await?;

        info!("user password updated");
        Ok(email)
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` if the user does not exist.
    #[instrument(skip(self, email))]
    pub async fn delete_user(&self, email: &str) -> Result<Email, UserError> {
        let email = Email::parse(email)?;
        self.store.delete(AccountKind::User, &email).await?;

        info!("user deleted");
        Ok(email)
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `UserError::AlreadyExists` if the email is already an admin.
    pub async fn add_admin(&self, email: &str, password: &str) -> Result<Email, UserError> {
        self.create(AccountKind::Admin, email, password).await
    }

    /// Set an admin's password, creating the admin if needed.
    ///
    /// # Errors
    ///
    /// Returns `UserError::StoreUnavailable` if the admin table cannot be written.
    #[instrument(skip(self, email, password))]
    pub async fn set_admin_password(&self, email: &str, password: &str) -> Result<Email, UserError> {
        let email = Email::parse(email)?;
        let digest = digest_for(password)?;

        self.store
            .upsert(AccountKind::Admin, &email, &digest)
            .await?;

        info!("admin password set");
        Ok(email)
    }

    #[instrument(skip(self, email, password))]
    async fn create(
        &self,
        kind: AccountKind,
        email: &str,
        password: &str,
    ) -> Result<Email, UserError> {
        let email = Email::parse(email)?;
        let digest = digest_for(password)?;

        self.store.create(kind, &email, &digest).await?;

        info!(table = %kind, "account created");
        Ok(email)
    }
}

fn digest_for(password: &str) -> Result<String, UserError> {
    if password.is_empty() {
        return Err(UserError::EmptyPassword);
    }
    Ok(hash_password(password)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::services::auth::Authenticator;
    use crate::store::InMemoryTable;

    fn store() -> (Arc<InMemoryTable>, Arc<InMemoryTable>, CredentialStore) {
        let admins = Arc::new(InMemoryTable::new("admins"));
        let users = Arc::new(InMemoryTable::new("users"));
        let store = CredentialStore::new(admins.clone(), users.clone(), Duration::from_millis(500));
        (admins, users, store)
    }

    #[tokio::test]
    async fn test_duplicate_add_keeps_first_digest() {
        let (_, _, store) = store();
        let users = UserService::new(&store);

        users.add_user("a@x.com", "p1").await.unwrap();
        assert!(matches!(
            users.add_user("a@x.com", "p2").await,
            Err(UserError::AlreadyExists)
        ));

        let auth = Authenticator::new(&store);
        assert!(auth.login("a@x.com", "p1").await.is_ok());
        assert!(auth.login("a@x.com", "p2").await.is_err());
    }

    #[tokio::test]
    async fn test_update_password_switches_credentials() {
        let (_, _, store) = store();
        let users = UserService::new(&store);
        users.add_user("a@x.com", "p1").await.unwrap();

        users.update_user_password("a@x.com", "p2").await.unwrap();

        let auth = Authenticator::new(&store);
        assert!(auth.login("a@x.com", "p2").await.is_ok());
        assert!(auth.login("a@x.com", "p1").await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (_, _, store) = store();
        assert!(matches!(
            UserService::new(&store)
                .update_user_password("ghost@x.com", "p2")
                .await,
            Err(UserError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_, users_table, store) = store();
        let users = UserService::new(&store);

        assert!(matches!(
            users.delete_user("a@x.com").await,
            Err(UserError::NotFound)
        ));

        users.add_user("a@x.com", "p1").await.unwrap();
        users.delete_user("a@x.com").await.unwrap();
        assert!(users_table.is_empty().await);
        assert!(Authenticator::new(&store).login("a@x.com", "p1").await.is_err());
    }

    #[tokio::test]
    async fn test_list_users_excludes_admins() {
        let (_, _, store) = store();
        let users = UserService::new(&store);
        users.add_user("b@x.com", "p1").await.unwrap();
        users.add_user("a@x.com", "p1").await.unwrap();
        users.add_admin("root@x.com", "pw").await.unwrap();

        let listed = users.list_users().await.unwrap();
        let emails: Vec<_> = listed.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["a@x.com", "b@x.com"]);
        assert!(listed.iter().all(|u| u.hashed_password.starts_with("$argon2id$")));
    }

    #[tokio::test]
    async fn test_validation() {
        let (_, users_table, store) = store();
        let users = UserService::new(&store);

        assert!(matches!(
            users.add_user("not-an-email", "p1").await,
            Err(UserError::InvalidEmail(_))
        ));
        assert!(matches!(
            users.add_user("a@x.com", "").await,
            Err(UserError::EmptyPassword)
        ));
        assert!(users_table.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_admin_password_upserts() {
        let (admins, _, store) = store();
        let users = UserService::new(&store);

        users.set_admin_password("root@x.com", "first").await.unwrap();
        users.set_admin_password("root@x.com", "second").await.unwrap();
        assert_eq!(admins.len().await, 1);

        let auth = Authenticator::new(&store);
        assert!(auth.admin_login("root@x.com", "second").await.is_ok());
        assert!(auth.admin_login("root@x.com", "first").await.is_err());
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let (_, users_table, store) = store();
        users_table.set_unavailable(true);

        assert!(matches!(
            UserService::new(&store).list_users().await,
            Err(UserError::StoreUnavailable(_))
        ));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_success_paths_do_not_log_emails() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (_, _, store) = store();
        let users = UserService::new(&store);
        users.add_user("secret-user@x.com", "p1").await.unwrap();
        users
            .update_user_password("secret-user@x.com", "p2")
            .await
            .unwrap();
        users.set_admin_password("secret-admin@x.com", "p3").await.unwrap();
        Authenticator::new(&store)
            .login("secret-user@x.com", "p2")
            .await
            .unwrap();
        Authenticator::new(&store)
            .admin_login("secret-admin@x.com", "p3")
            .await
            .unwrap();
        users.delete_user("secret-user@x.com").await.unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("user deleted"));
        assert!(!output.contains("secret-user@x.com"));
        assert!(!output.contains("secret-admin@x.com"));
    }
}
