//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication.
///
/// A login attempt only ever fails with [`AuthError::InvalidCredentials`],
/// whatever the cause: unknown email, wrong password, a record without a
/// digest, or a table that could not be read.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong password, unknown email, or lookup failure).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
