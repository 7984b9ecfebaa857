//! Authentication service.
//!
//! Resolves an email/password pair to an account in one of the two tables.
//!
//! # Lookup order
//!
//! ```text
//! admin login:    admin table only
//! regular login:  users table, then admin table if the user record is absent
//! ```
//!
//! A regular login that lands in the admin table succeeds as an admin. An
//! email present in both tables always resolves to the users table on a
//! regular login.
//!
//! Every failure collapses into [`AuthError::InvalidCredentials`]. Table
//! errors fail closed: a users-table lookup that errors (rather than
//! returning "absent") does not fall through to the admin table.

mod error;
mod password;

pub use error::AuthError;
pub use password::{hash_password, verify_password};

use tracing::{debug, instrument, warn};

use agentbridge_core::{AccountKind, Email};

use crate::store::{AccountRecord, CredentialStore, StoreError};

/// A successfully authenticated account.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// Table the record was found in.
    pub kind: AccountKind,
    /// The matched record.
    pub record: AccountRecord,
}

impl Authenticated {
    /// Whether the account authenticated as an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.kind.is_admin()
    }

    /// Display name (the stored row key).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.email
    }
}

/// Authentication service.
pub struct Authenticator<'a> {
    store: &'a CredentialStore,
}

impl<'a> Authenticator<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a CredentialStore) -> Self {
        Self { store }
    }

    /// Login through the admin entry point (admin table only).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the credentials do not
    /// match an admin account.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<Authenticated, AuthError> {
        self.resolve(email, password, true).await
    }

    /// Login through the regular entry point (users table, then admin table).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the credentials do not
    /// match any account.
    pub async fn login(&self, email: &str, password: &str) -> Result<Authenticated, AuthError> {
        self.resolve(email, password, false).await
    }

    /// Resolve credentials to an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is malformed, no
    /// record is found in the tables consulted, the digest does not match,
    /// or a table lookup fails.
    #[instrument(skip(self, email, password))]
    pub async fn resolve(
        &self,
        email: &str,
        password: &str,
        intended_admin: bool,
    ) -> Result<Authenticated, AuthError> {
        let Ok(email) = Email::parse(email) else {
            password::burn_decoy(password);
            return Err(AuthError::InvalidCredentials);
        };

        let Some((kind, record)) = self.lookup(&email, intended_admin).await? else {
            debug!(email = %email, "no account found");
            password::burn_decoy(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, record.digest()) {
            debug!(email = %email, table = %kind, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(table = %kind, "authenticated");
        Ok(Authenticated { kind, record })
    }

    /// Find the record to verify against, following the lookup order.
    async fn lookup(
        &self,
        email: &Email,
        intended_admin: bool,
    ) -> Result<Option<(AccountKind, AccountRecord)>, AuthError> {
        if !intended_admin && let Some(record) = self.fetch(AccountKind::User, email).await? {
            return Ok(Some((AccountKind::User, record)));
        }

        Ok(self
            .fetch(AccountKind::Admin, email)
            .await?
            .map(|record| (AccountKind::Admin, record)))
    }

    /// Fetch one record, separating "absent" from "lookup failed".
    async fn fetch(
        &self,
        kind: AccountKind,
        email: &Email,
    ) -> Result<Option<AccountRecord>, AuthError> {
        match self.store.get(kind, email).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => {
                warn!(table = %kind, email = %email, error = %e, "account lookup failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
